use crate::cli::OutputFormat;
use crate::permissions::PERMISSION_GROUPS;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(PERMISSION_GROUPS)?);
        }
        OutputFormat::Text => {
            for group in PERMISSION_GROUPS {
                println!("{} ({})", group.title, group.description);
                for permission in group.permissions {
                    println!("  {:<28} {}", permission.key, permission.label);
                }
            }
        }
    }
    Ok(())
}
