//! Building container runtime command lines.
//!
//! [`PodmanCommand`] collects the argument list of a `podman` invocation.
//! Once complete, [`PodmanCommand::to_exec`] renders it as a single escaped
//! string suitable for an `ExecStart=` value.
//!
//! ## Examples
//!
//! ```rust
//! use quadlet_unit::{PodmanCommand, Ranges};
//! use std::collections::BTreeMap;
//!
//! let mut env = BTreeMap::new();
//! env.insert("TERM".to_string(), "xterm 256".to_string());
//!
//! let mut podman = PodmanCommand::new(["run", "--rm"]);
//! podman.add_env(&env);
//! podman.add_id_maps("--uidmap", 0, 1000, 1, &Ranges::new(100_000, 10));
//! podman.add("fedora");
//!
//! assert_eq!(
//!     podman.to_exec(),
//!     "/usr/bin/podman run --rm --env \"TERM=xterm 256\" \
//!      --uidmap 0:1000:1 --uidmap 1:100000:10 fedora"
//! );
//! ```

use crate::escape::escape_words;
use crate::idmap::allocate_id_map;
use crate::ranges::Ranges;
use std::collections::BTreeMap;

/// Default path of the runtime binary.
pub const PODMAN_BINARY: &str = "/usr/bin/podman";

/// An argument list, starting with the runtime binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodmanCommand {
    args: Vec<String>,
}

impl PodmanCommand {
    /// Starts a command with [`PODMAN_BINARY`] followed by `args`.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cmd = PodmanCommand {
            args: vec![PODMAN_BINARY.to_string()],
        };
        cmd.extend(args);
        cmd
    }

    /// Replaces the runtime binary.
    ///
    /// ```rust
    /// use quadlet_unit::PodmanCommand;
    ///
    /// let cmd = PodmanCommand::new(["volume", "create"]).with_binary("/opt/bin/podman");
    /// assert_eq!(cmd.args()[0], "/opt/bin/podman");
    /// ```
    #[must_use]
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.args[0] = binary.to_string();
        self
    }

    /// Appends one argument.
    pub fn add<S: Into<String>>(&mut self, arg: S) {
        self.args.push(arg.into());
    }

    /// Appends several arguments in order.
    pub fn extend<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
    }

    /// Adds `flag key=value` for every entry, ordered by key.
    pub fn add_keys(&mut self, flag: &str, keys: &BTreeMap<String, String>) {
        for (key, value) in keys {
            self.add(flag);
            self.add(format!("{key}={value}"));
        }
    }

    /// Adds `--env key=value` for every entry.
    pub fn add_env(&mut self, env: &BTreeMap<String, String>) {
        self.add_keys("--env", env);
    }

    /// Adds `--label key=value` for every entry.
    pub fn add_labels(&mut self, labels: &BTreeMap<String, String>) {
        self.add_keys("--label", labels);
    }

    /// Adds `--annotation key=value` for every entry.
    pub fn add_annotations(&mut self, annotations: &BTreeMap<String, String>) {
        self.add_keys("--annotation", annotations);
    }

    /// Adds one `flag container:host:length` pair per mapping computed by
    /// [`allocate_id_map`].
    pub fn add_id_maps(
        &mut self,
        flag: &str,
        container_id: u32,
        host_id: u32,
        identity_threshold: u32,
        available_host_ids: &Ranges,
    ) {
        for mapping in allocate_id_map(container_id, host_id, identity_threshold, available_host_ids) {
            self.add(flag);
            self.add(mapping.to_string());
        }
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn into_args(self) -> Vec<String> {
        self.args
    }

    /// The argument list as one escaped command line.
    #[must_use]
    pub fn to_exec(&self) -> String {
        escape_words(&self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_new_starts_with_binary() {
        let cmd = PodmanCommand::new(Vec::<String>::new());
        assert_eq!(cmd.args(), ["/usr/bin/podman"]);
    }

    #[test]
    fn test_keys_sorted() {
        let mut cmd = PodmanCommand::new(["run"]);
        cmd.add_labels(&map(&[("b", "2"), ("a", "1")]));
        cmd.add_annotations(&map(&[("note", "x=y")]));
        assert_eq!(
            cmd.into_args(),
            vec![
                "/usr/bin/podman",
                "run",
                "--label",
                "a=1",
                "--label",
                "b=2",
                "--annotation",
                "note=x=y",
            ]
        );
    }

    #[test]
    fn test_id_maps_flags() {
        let mut cmd = PodmanCommand::new(["run"]);
        cmd.add_id_maps("--gidmap", 0, 0, 2, &Ranges::new(5000, 1));
        assert_eq!(
            cmd.args()[2..],
            ["--gidmap", "0:0:1", "--gidmap", "1:1:1", "--gidmap", "2:5000:1"]
        );
    }

    #[test]
    fn test_to_exec_escapes() {
        let mut cmd = PodmanCommand::new(["run"]);
        cmd.extend(["sh", "-c", "echo hi; exit 1"]);
        assert_eq!(
            cmd.to_exec(),
            "/usr/bin/podman run sh -c \"echo hi\\; exit 1\""
        );
    }
}
