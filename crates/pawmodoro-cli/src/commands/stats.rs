use pawmodoro_core::Config;

use super::open_ledger;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let ledger = open_ledger(&config)?;
    let stats = ledger.stats()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

pub fn history(limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let ledger = open_ledger(&config)?;
    let records = ledger.history(limit)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
