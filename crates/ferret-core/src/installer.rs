//! Bundled default actions, installed copy-if-absent into the actions root.
//!
//! Installation runs on first use of the tree or on an explicit refresh
//! request, and never overwrites a file the user already has. Edits to the
//! bundled scripts survive every reinstall.

use crate::error::Result;
use crate::io;
use std::path::Path;
use tracing::info;

/// (relative path under the actions root, script body)
const DEFAULT_ACTIONS: &[(&str, &str)] = &[
    (
        "open-with?command.sh",
        "#!/bin/sh\n\
         # Open the selection with a command of your choice.\n\
         exec \"$command\" \"$@\"\n",
    ),
    (
        "edit!.sh",
        "#!/bin/sh\nexec \"${EDITOR:-vi}\" \"$@\"\n",
    ),
    (
        "text/grep?pattern.sh",
        "#!/bin/sh\nexec grep -Hn -- \"$pattern\" \"$@\"\n",
    ),
    (
        "text/wordcount.sh",
        "#!/bin/sh\nexec wc \"$@\"\n",
    ),
    (
        "image/convert?width?height!.sh",
        "#!/bin/sh\n\
         for f in \"$@\"; do\n\
         \tconvert \"$f\" -resize \"${width}x${height}\" \"resized_$f\"\n\
         done\n",
    ),
    (
        "image/png/optimize.sh",
        "#!/bin/sh\nexec optipng \"$@\"\n",
    ),
    (
        "video/play.sh",
        "#!/bin/sh\nexec mpv -- \"$@\"\n",
    ),
    (
        "application/zip/extract.sh",
        "#!/bin/sh\n\
         for f in \"$@\"; do\n\
         \tunzip -n \"$f\"\n\
         done\n",
    ),
];

/// Install every bundled action that is not already present and mark it
/// executable. Returns the number of files written.
pub fn install_defaults(actions_root: &Path) -> Result<usize> {
    let mut installed = 0;
    for (rel, body) in DEFAULT_ACTIONS {
        let path = actions_root.join(rel);
        if io::write_if_missing(&path, body.as_bytes())? {
            io::make_executable(&path)?;
            installed += 1;
        }
    }
    if installed > 0 {
        info!(installed, root = %actions_root.display(), "installed default actions");
    }
    Ok(installed)
}
