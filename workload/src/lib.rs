//! MapReduce applications that can be run by name.

use common::Workload;

pub mod wc;

/// Names of every registered workload.
pub const NAMES: &[&str] = &["wc"];

/// Looks up a workload by the name used on the command line.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "wc" => Some(Workload {
            map_fn: wc::map,
            reduce_fn: wc::reduce,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_resolves() {
        for name in NAMES {
            assert!(try_named(name).is_some(), "{name} is not registered");
        }
        assert!(try_named("grep").is_none());
    }
}
