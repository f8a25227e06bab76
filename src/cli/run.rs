use crate::error::Result;
use crate::settings::Settings;

pub fn run(settings: &Settings) -> Result<()> {
    super::clean::run(settings)?;
    super::plot::run(settings)
}
