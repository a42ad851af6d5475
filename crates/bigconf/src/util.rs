/// Parts of a `/partition[/folder...]/name` address
#[derive(Debug, PartialEq)]
pub struct QualifiedName<'a> {
    pub partition: &'a str,
    pub folder: Option<String>,
    pub name: &'a str,
}

impl<'a> QualifiedName<'a> {
    /// Returns `None` unless there is a leading `/` and at least one more `/`
    pub fn parse(qualified: &'a str) -> Option<Self> {
        let segments: Vec<&str> = qualified.strip_prefix('/')?.split('/').collect();
        let [partition, middle @ .., name] = segments.as_slice() else {
            return None;
        };

        if partition.is_empty() || name.is_empty() {
            return None;
        }

        Some(Self {
            partition: *partition,
            folder: (!middle.is_empty()).then(|| middle.join("/")),
            name: *name,
        })
    }
}

/// Splits a pool member (`/Common/web1:80`, `/Common/2001:db8::1.80`) into node name and port
pub fn split_member(member: &str) -> (&str, Option<&str>) {
    let is_ipv6 = member.matches(':').count() > 1;
    let split = if is_ipv6 {
        member.rsplit_once('.')
    } else {
        member.split_once(':')
    };

    match split {
        Some((node, port)) => (node, Some(port)),
        None => (member, None),
    }
}
