use anyhow::{anyhow, Result};
use labcoat_app_core::persistence::FilePersistence;
use labcoat_core::Account;

pub struct AccountManager {
    persistence: FilePersistence,
}

impl AccountManager {
    pub fn new() -> Self {
        Self {
            persistence: FilePersistence::new(),
        }
    }

    pub fn with_persistence(persistence: FilePersistence) -> Self {
        Self { persistence }
    }

    pub fn current(&self) -> Result<Account> {
        self.persistence
            .load_account()?
            .ok_or_else(|| anyhow!("No account configured (run `labcoat account set`)"))
    }

    pub fn set(&self, server: String, token: String, username: Option<String>) -> Result<Account> {
        let account = Account {
            server_url: server.trim().trim_end_matches('/').to_string(),
            private_token: token.trim().to_string(),
            username: username.filter(|u| !u.trim().is_empty()),
        };
        account.validate()?;
        self.persistence.save_account(&account)?;
        Ok(account)
    }
}

impl Default for AccountManager {
    fn default() -> Self {
        Self::new()
    }
}

fn mask(token: &str) -> String {
    let tail: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("****{tail}")
    }
}

pub fn handle_set(
    mgr: &AccountManager,
    server: String,
    token: String,
    username: Option<String>,
) -> Result<()> {
    let account = mgr.set(server, token, username)?;
    println!("Account for {} saved.", account.server_url);
    Ok(())
}

pub fn handle_show(mgr: &AccountManager) -> Result<()> {
    let account = mgr.current()?;
    println!("{:<10} {}", "SERVER", account.server_url);
    println!("{:<10} {}", "USER", account.username.as_deref().unwrap_or("-"));
    println!("{:<10} {}", "TOKEN", mask(&account.private_token));
    Ok(())
}
