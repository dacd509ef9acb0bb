use anyhow::Result;

pub mod config;
pub mod serve;
pub mod show;
pub mod stages;

pub use config::ConfigCommand;
pub use serve::ServeCommand;
pub use show::ShowCommand;
pub use stages::StagesCommand;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
