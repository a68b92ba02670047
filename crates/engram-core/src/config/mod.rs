mod settings;

pub use settings::EngramConfig;
