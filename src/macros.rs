/// Builds a [`UnitFile`](crate::UnitFile) from a literal description.
///
/// Groups are created in the order written. Every `key => value` pair is
/// appended, so a key may be repeated. Values can be anything that
/// implements `Display`.
///
/// ```rust
/// use quadlet_unit::unit_file;
///
/// let unit = unit_file! {
///     "Unit" => {
///         "Description" => "web server",
///     },
///     "Service" => {
///         "Environment" => "A=1",
///         "Environment" => "B=2",
///         "TimeoutStartSec" => 900,
///     },
/// };
///
/// assert_eq!(unit.lookup_all("Service", "Environment"), vec!["A=1", "B=2"]);
/// assert_eq!(unit.lookup_int("Service", "TimeoutStartSec", 0), 900);
/// ```
#[macro_export]
macro_rules! unit_file {
    () => {
        $crate::UnitFile::new()
    };

    ($($group:literal => { $($key:literal => $value:expr),* $(,)? }),+ $(,)?) => {{
        let mut unit = $crate::UnitFile::new();
        $(
            unit.add_group($group);
            $(
                unit.add($group, $key, &$value.to_string());
            )*
        )+
        unit
    }};
}
