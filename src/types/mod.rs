pub mod events;
pub mod globals;

pub use events::{
    CallToolResponse, GlobalsPatch, HostEvent, SetGlobalsEvent, SET_GLOBALS_EVENT_TYPE,
};
pub use globals::{
    Capabilities, Device, DeviceType, DisplayMode, GlobalKey, OpenAiGlobals, SafeArea,
    SafeAreaInsets, Theme, UserAgent,
};
