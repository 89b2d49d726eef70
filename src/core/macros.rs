//! Macros for declaring rule sets.

/// Build a [`RuleSet`](crate::core::RuleSet) from a scene-keyed table.
///
/// # Example
///
/// ```
/// use scenegate::core::Scene;
/// use scenegate::rule_set;
///
/// let rules = rule_set! {
///     Scene::CREATE => {
///         "age" => "required,min=18",
///         "email" => "required,email",
///     },
///     Scene::UPDATE | Scene::IMPORT => {
///         "email" => "omitempty,email",
///     },
/// };
///
/// assert_eq!(rules.len(), 2);
/// ```
#[macro_export]
macro_rules! rule_set {
    (
        $(
            $scene:expr => {
                $($field:literal => $rule:expr),* $(,)?
            }
        ),* $(,)?
    ) => {{
        let rules = $crate::core::RuleSet::new();
        $(
            let pairs: ::std::vec::Vec<(&str, &str)> = ::std::vec![$(($field, $rule)),*];
            let rules = rules.scene($scene, pairs);
        )*
        rules
    }};
}
