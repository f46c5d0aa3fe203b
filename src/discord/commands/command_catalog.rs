// Discord commands module.

pub mod briefs;

// Bot presence management
pub mod presence;
