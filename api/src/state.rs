use udf_rs::query::UdfEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: UdfEngine,
}

impl AppState {
    pub fn new(engine: UdfEngine) -> Self {
        Self { engine }
    }
}
