//! The Cuebot RPC interfaces exposed through the gateway.

/// Fully-qualified names, `<proto package>.<service>`, in registration order.
pub const OPENCUE_INTERFACES: [&str; 21] = [
    "show.ShowInterface",
    "job.FrameInterface",
    "job.GroupInterface",
    "job.JobInterface",
    "job.LayerInterface",
    "host.DeedInterface",
    "host.HostInterface",
    "host.OwnerInterface",
    "host.ProcInterface",
    "comment.CommentInterface",
    "facility.AllocationInterface",
    "facility.FacilityInterface",
    "filter.FilterInterface",
    "filter.ActionInterface",
    "filter.MatcherInterface",
    "depend.DependInterface",
    "subscription.SubscriptionInterface",
    "limit.LimitInterface",
    "service.ServiceInterface",
    "service.ServiceOverrideInterface",
    "task.TaskInterface",
];

/// True for a non-empty run of `[A-Za-z0-9_]`.
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split `<package>.<Interface>` into its two parts.
///
/// Both parts must be non-empty identifiers (`[A-Za-z0-9_]`), and the
/// package may itself contain dots.
pub fn split_interface_name(name: &str) -> Option<(&str, &str)> {
    let (package, service) = name.rsplit_once('.')?;
    if !is_identifier(service) || !package.split('.').all(is_identifier) {
        return None;
    }
    Some((package, service))
}
