use clap::Subcommand;
use pawmodoro_core::{Catalog, Config, PetId, PurchaseOutcome};
use serde::Serialize;

use super::open_ledger;

#[derive(Subcommand)]
pub enum ShopAction {
    /// List pets for sale with prices and ownership
    List,
    /// Buy a pet with earned coins
    Buy {
        /// Pet id (e.g. "dog")
        pet: String,
    },
}

#[derive(Serialize)]
struct ShopItem {
    id: &'static str,
    name: &'static str,
    kind: &'static str,
    price: u64,
    owned: bool,
}

pub fn run(action: ShopAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let ledger = open_ledger(&config)?;

    match action {
        ShopAction::List => {
            let progress = ledger.progress()?;
            let items: Vec<ShopItem> = Catalog::all()
                .iter()
                .map(|entry| ShopItem {
                    id: entry.id,
                    name: entry.name,
                    kind: entry.kind,
                    price: entry.price,
                    owned: progress.owned_pets.iter().any(|p| p.id.as_str() == entry.id),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        ShopAction::Buy { pet } => {
            let pet = PetId::parse(&pet)?;
            let outcome = ledger.buy_pet(&pet)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let PurchaseOutcome::InsufficientFunds { balance, price } = outcome {
                return Err(format!("not enough coins for {pet}: have {balance}, need {price}").into());
            }
        }
    }
    Ok(())
}
