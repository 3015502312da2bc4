pub mod impact;
pub mod materials;
pub mod rebuild;
pub mod review;
pub mod serve;
pub mod stats;
pub mod submit;

use uuid::Uuid;
use woza_core::ImpactEntry;

/// Parses `material=kg`, e.g. `pet=2.5`.
pub fn parse_entry(raw: &str) -> Result<ImpactEntry, String> {
    let (material, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected material=kg, got '{}'", raw))?;
    let material = material.trim();
    if material.is_empty() {
        return Err(format!("missing material name in '{}'", raw));
    }
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a weight in kg", weight.trim()))?;
    Ok(ImpactEntry::new(material, weight))
}

/// Who the command runs as. Office staff default to admin.
#[derive(Debug, Clone, clap::Args)]
pub struct Identity {
    /// Acting user id
    #[arg(long = "user", global = true, env = "WOZA_USER_ID")]
    pub user_id: Option<Uuid>,

    /// admin, collector or customer
    #[arg(long, global = true, env = "WOZA_ROLE", default_value = "admin")]
    pub role: woza_core::models::session::Role,
}

impl Identity {
    pub fn session(&self) -> woza_core::models::session::Session {
        woza_core::models::session::Session::login(self.user_id.unwrap_or_else(Uuid::nil), self.role)
    }

    /// For commands that record who did the work. A real user id is required.
    pub fn named_session(&self) -> anyhow::Result<woza_core::models::session::Session> {
        match self.user_id {
            Some(id) if !id.is_nil() => Ok(woza_core::models::session::Session::login(id, self.role)),
            _ => anyhow::bail!("--user (or WOZA_USER_ID) must name the acting user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry() {
        let entry = parse_entry("PET = 2.5").unwrap();
        assert_eq!(entry.material_id, "PET");
        assert_eq!(entry.weight_kg, 2.5);

        assert!(parse_entry("pet").is_err());
        assert!(parse_entry("=2").is_err());
        assert!(parse_entry("pet=heavy").is_err());
    }

    #[test]
    fn test_named_session_needs_a_real_user() {
        let role = woza_core::models::session::Role::Collector;
        let anonymous = Identity { user_id: None, role };
        let nil = Identity { user_id: Some(Uuid::nil()), role };
        assert!(anonymous.named_session().is_err());
        assert!(nil.named_session().is_err());

        let id = Uuid::new_v4();
        let session = Identity { user_id: Some(id), role }.named_session().unwrap();
        assert_eq!(session.user_id, id);
    }
}
