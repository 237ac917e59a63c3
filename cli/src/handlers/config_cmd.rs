//! Handling for `mashup config ...`.

use super::ConfigCommand;

impl ConfigCommand {
    pub fn handle(&self, settings: &mashup_core::config::Settings) -> i32 {
        match self {
            Self::Path => match mashup_core::config::Settings::get_config_path() {
                Ok(path) => {
                    println!("{}", path.display());
                    0
                }
                Err(error) => {
                    eprintln!("could not resolve the config path: {error}");
                    3
                }
            },
            Self::Show => {
                println!("{settings:#?}");
                0
            }
        }
    }
}
