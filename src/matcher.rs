use crate::executor::{Launcher, ProcessRunner};
use crate::model::Rule;
use log::{debug, info, warn};

/// Launches the target of the first matching rule that starts successfully.
///
/// A failed launch falls through to the next rule. Returns `false` when no
/// rule matched or every matching launch failed.
pub fn route<R: ProcessRunner>(url: &str, rules: &[Rule], launcher: &Launcher<R>) -> bool {
    for rule in rules {
        if !rule.pattern.is_match(url) {
            continue;
        }

        debug!("{} matched {} -> {}", url, rule.pattern, rule.target);
        match launcher.launch(&rule.target, &[url]) {
            Ok(()) => {
                info!("Opened {} with {}", url, rule.target);
                return true;
            }
            Err(e) => warn!("{}: {}", rule.target, e),
        }
    }

    false
}
