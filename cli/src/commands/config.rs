use anyhow::Result;
use ollama_inspect_core::Config;

pub fn execute(key: Option<&str>, value: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;

    match (key, value) {
        // Show all config
        (None, None) => {
            println!("Configuration file: {:?}\n", Config::config_path()?);
            println!("[models]");
            println!("  root = {:?}", config.models.root.display().to_string());
            println!();
            println!("[output]");
            println!("  size_unit = \"{}\"", config.output.size_unit.as_str());
            println!("  color = {}", config.output.color);
            println!("  columns = \"{}\"", config.output.columns);
        }

        // Get a specific key
        (Some(key), None) => {
            println!("{}", config.get(key)?);
        }

        // Set a specific key
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }

        _ => unreachable!(),
    }

    Ok(())
}
