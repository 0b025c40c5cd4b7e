use std::path::{Path, PathBuf};

use crate::types::FollowKey;

/// `<out_dir>/<namespace>_<pod>_<uid>_<container>.log`
///
/// Pod and container names are DNS labels and UIDs have a fixed shape, so none of
/// the parts can contain the `_` separator.
pub fn log_file_path(out_dir: &Path, key: &FollowKey) -> PathBuf {
    out_dir.join(format!(
        "{}_{}_{}_{}.log",
        key.pod.namespace, key.pod.name, key.pod.uid, key.container
    ))
}
