//! Mail store access: the Thunderbird Gloda database.

pub mod gloda;
