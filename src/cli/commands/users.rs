//! User account commands.

use console::style;

use crate::config::Settings;

use super::helpers::truncate;

/// List imported user accounts.
pub async fn cmd_users_list(settings: &Settings, limit: i64) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    let users = ctx.users();

    let total = users.count().await?;
    let accounts = users.list(limit).await?;

    if accounts.is_empty() {
        println!("{} No users imported yet.", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Users").bold());
    println!("{}", "-".repeat(78));
    println!(
        "{:<18} {:<28} {:<18} {:<10}",
        "Username", "Email", "Name", "Role"
    );
    println!("{}", "-".repeat(78));

    for account in &accounts {
        let name = format!("{} {}", account.first_name, account.last_name);
        println!(
            "{:<18} {:<28} {:<18} {:<10}",
            truncate(&account.username, 17),
            truncate(&account.email, 27),
            truncate(name.trim(), 17),
            account.role
        );
    }

    if total > accounts.len() as i64 {
        println!("\n  Showing {} of {} users", accounts.len(), total);
    }

    Ok(())
}
