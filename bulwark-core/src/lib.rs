use bulwark_antinuke::AntiNuke;
use bulwark_database::Database;

pub type Error = anyhow::Error;

#[derive(Clone, Debug)]
pub struct Data {
    pub db: Database,
    pub antinuke: AntiNuke,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
