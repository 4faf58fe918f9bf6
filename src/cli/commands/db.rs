//! Database management commands.

use console::style;

use crate::config::Settings;

/// Run database migrations.
pub async fn cmd_migrate(settings: &Settings, check: bool) -> anyhow::Result<()> {
    println!("{} Database migration", style("→").cyan());
    println!("  Database: {}", settings.database_path().display());

    settings.ensure_directories()?;
    let ctx = settings.create_db_context();

    if check {
        // Just report status
        let tables = ctx.list_tables().await?;
        let initialized = tables.iter().any(|t| t == "users")
            && tables.iter().any(|t| t == "import_jobs");
        if initialized {
            println!("\n{} Schema is up to date.", style("✓").green());
        } else {
            println!(
                "\n{} Database not initialized. Run 'roster db migrate' to initialize.",
                style("!").yellow()
            );
        }
        return Ok(());
    }

    println!("\n{} Running migrations...", style("→").cyan());
    match ctx.init_schema().await {
        Ok(()) => {
            println!("{} Migration complete!", style("✓").green());
        }
        Err(e) => {
            eprintln!("{} Migration failed: {}", style("✗").red(), e);
            return Err(anyhow::anyhow!("Migration failed: {}", e));
        }
    }

    Ok(())
}

/// List tables in the database.
pub async fn cmd_tables(settings: &Settings) -> anyhow::Result<()> {
    if !settings.database_exists() {
        println!(
            "{} No database at {}. Run 'roster db migrate' first.",
            style("!").yellow(),
            settings.database_path().display()
        );
        return Ok(());
    }

    let ctx = settings.create_db_context();
    let tables = ctx.list_tables().await?;

    if tables.is_empty() {
        println!(
            "{} No tables found. Run 'roster db migrate' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Tables").bold());
    println!("{}", "-".repeat(30));
    for table in tables {
        println!("  {}", table);
    }

    Ok(())
}
