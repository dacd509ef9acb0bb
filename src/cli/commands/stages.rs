use anyhow::Result;

use super::Command;
use crate::catalog::{StageCatalog, StageKey, StageKind};

#[derive(Default)]
pub struct StagesCommand;

impl StagesCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for StagesCommand {
    async fn execute(&self) -> Result<()> {
        let catalog = StageCatalog::builtin();

        println!("📋 BASE STAGES (in order):");
        for (index, key) in catalog.base_stages().iter().enumerate() {
            println!("   {}. {}", index + 1, key);
        }
        println!();

        println!("🔁 PER-UNIT PHASES:");
        for key in StageKey::ALL.iter().filter(|k| k.kind() == StageKind::Unit) {
            println!("   → {key}");
        }
        println!();

        println!("🏁 FINAL STAGE:");
        for key in StageKey::ALL.iter().filter(|k| k.kind() == StageKind::Terminal) {
            println!("   → {key}");
        }
        Ok(())
    }
}
