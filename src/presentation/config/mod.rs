mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, LoggingSettings, MessagingProvider, MessagingSettings, ProcessorSettings,
    ServerSettings, Settings, SpeechSettings, StorageProviderSetting, StorageSettings,
    StoreProvider, StoreSettings, SummarizationSettings, TranscoderSettings,
};
