use bindarb_abi::net::{EPHEMERAL_PORT_END, EPHEMERAL_PORT_START, MAX_SOCKETS};
use bindarb_lib::{KlogLevel, klog_set_level};

const DEFAULT_EPHEMERAL_RANGE: (u16, u16) = (EPHEMERAL_PORT_START, EPHEMERAL_PORT_END);
const DEFAULT_MAX_SOCKETS: usize = MAX_SOCKETS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetConfig {
    /// Inclusive range handed to the ephemeral allocator.
    pub ephemeral_range: (u16, u16),
    pub max_sockets: usize,
    /// Log level requested on the command line, if any.
    pub log_level: Option<KlogLevel>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            ephemeral_range: DEFAULT_EPHEMERAL_RANGE,
            max_sockets: DEFAULT_MAX_SOCKETS,
            log_level: None,
        }
    }
}

impl NetConfig {
    /// Push the requested log level into klog. No-op if none was given.
    pub fn apply_log_level(&self) {
        if let Some(level) = self.log_level {
            klog_set_level(level);
        }
    }
}

fn parse_range(value: &str) -> Option<(u16, u16)> {
    let (start, end) = value.split_once('-')?;
    let start = start.parse::<u16>().ok()?;
    let end = end.parse::<u16>().ok()?;
    if start == 0 || end < start {
        return None;
    }
    Some((start, end))
}

pub fn config_from_cmdline(cmdline: Option<&str>) -> NetConfig {
    let mut cfg = NetConfig::default();
    if let Some(cmdline) = cmdline {
        for token in cmdline.split_whitespace() {
            if let Some(value) = token.strip_prefix("net.ephemeral=") {
                if let Some(range) = parse_range(value) {
                    cfg.ephemeral_range = range;
                }
            } else if let Some(value) = token.strip_prefix("net.max_sockets=") {
                if let Ok(parsed) = value.parse::<usize>() {
                    if parsed > 0 {
                        cfg.max_sockets = parsed;
                    }
                }
            } else if let Some(value) = token.strip_prefix("net.log=") {
                // Unknown level names keep the current level.
                if let Some(level) = KlogLevel::from_name(value) {
                    cfg.log_level = Some(level);
                }
            }
        }
    }
    cfg
}
