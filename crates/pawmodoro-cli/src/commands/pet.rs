use clap::Subcommand;
use pawmodoro_core::{Config, PetId};
use serde::Serialize;

use super::open_ledger;

#[derive(Subcommand)]
pub enum PetAction {
    /// List owned pets
    List,
    /// Choose the pet that joins future sessions
    Use {
        /// Pet id (e.g. "cat")
        pet: String,
    },
    /// Run sessions without a pet
    Clear,
}

#[derive(Serialize)]
struct OwnedPetView {
    id: String,
    name: String,
    active: bool,
    purchased_at: String,
}

pub fn run(action: PetAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let ledger = open_ledger(&config)?;

    match action {
        PetAction::List => {
            let progress = ledger.progress()?;
            let pets: Vec<OwnedPetView> = progress
                .owned_pets
                .iter()
                .map(|owned| OwnedPetView {
                    id: owned.id.to_string(),
                    name: owned
                        .id
                        .entry()
                        .map(|e| e.name.to_string())
                        .unwrap_or_else(|| owned.id.to_string()),
                    active: progress.active_pet.as_ref() == Some(&owned.id),
                    purchased_at: owned.purchased_at.to_rfc3339(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&pets)?);
        }
        PetAction::Use { pet } => {
            let pet = PetId::parse(&pet)?;
            ledger.set_active_pet(Some(&pet))?;
            println!("active pet: {pet}");
        }
        PetAction::Clear => {
            ledger.set_active_pet(None)?;
            println!("no active pet");
        }
    }
    Ok(())
}
