//! Schema migration command

use fdsync_engine::PipelineConfig;
use fdsync_store::{db, migrations};

pub fn execute(config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let conn = db::open_migrated(&config.database_path)?;

    println!("Migrations applied to {}:", config.database_path.display());
    for migration_id in migrations::applied_migrations(&conn)? {
        println!("  {}", migration_id);
    }

    Ok(())
}
