pub const PROTOCOL_LITERAL: &str = "drc-20";
pub const MAX_SUPPLY_WIDTH: usize = 20;
