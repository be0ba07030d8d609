mod logger;
mod settings;
