use std::sync::Arc;

use reqwest::Client;

use super::config::Config;

pub struct State {
    pub config: Config,
    pub client: Client,
}

impl State {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            config,
            client: Client::new(),
        })
    }
}
