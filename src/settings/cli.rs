use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Credential and session service")]
pub struct Cli {
    /// Settings file; defaults to the build profile's file under `settings/`.
    #[arg(long)]
    pub settings: Option<String>,
}
