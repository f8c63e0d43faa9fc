//! Core types shared by the prober, the history merge and the CLI.

use nodeinfo::NodeInfo;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// A checked instance: `host` or `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(pub String);

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target(s.to_string())
    }
}

impl Target {
    /// Host portion with any port suffix stripped. `[v6]:port` yields the bare v6 address.
    pub fn host(&self) -> &str {
        let s = self.0.as_str();
        if let Some(rest) = s.strip_prefix('[') {
            if let Some((addr, _)) = rest.split_once(']') { return addr; }
        }
        s.split(':').next().unwrap_or(s)
    }

    pub fn well_known_url(&self) -> String {
        format!("https://{}/.well-known/nodeinfo", self.0)
    }
}

/// Result of checking one target. Exactly one is produced per target per run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Unresolved,
    NotFunctioning,
    WrongCode(u16),
    MisformattedList,
    NoAvailableSchema,
    MisformattedSchema,
    Valid(Box<NodeInfo>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Unresolved,
    NotFunctioning,
    WrongCode,
    MisformattedList,
    NoAvailableSchema,
    MisformattedSchema,
    Valid,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Unresolved,
        Category::NotFunctioning,
        Category::WrongCode,
        Category::MisformattedList,
        Category::NoAvailableSchema,
        Category::MisformattedSchema,
        Category::Valid,
    ];

    /// Key used for this category in the snapshot document.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Unresolved => "unresolved",
            Category::NotFunctioning => "not_functioning",
            Category::WrongCode => "wrong_code",
            Category::MisformattedList => "misformatted_nodeinfo_list",
            Category::NoAvailableSchema => "no_available_nodeinfo_schema",
            Category::MisformattedSchema => "misformatted_nodeinfo_schema",
            Category::Valid => "valid",
        }
    }
}

impl ProbeOutcome {
    pub fn category(&self) -> Category {
        match self {
            ProbeOutcome::Unresolved => Category::Unresolved,
            ProbeOutcome::NotFunctioning => Category::NotFunctioning,
            ProbeOutcome::WrongCode(_) => Category::WrongCode,
            ProbeOutcome::MisformattedList => Category::MisformattedList,
            ProbeOutcome::NoAvailableSchema => Category::NoAvailableSchema,
            ProbeOutcome::MisformattedSchema => Category::MisformattedSchema,
            ProbeOutcome::Valid(_) => Category::Valid,
        }
    }
}

/// One run's outcomes, grouped by category. Order inside a group is arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeGroups {
    pub unresolved: Vec<String>,
    pub not_functioning: Vec<String>,
    pub wrong_code: Vec<(String, u16)>,
    pub misformatted_list: Vec<String>,
    pub no_available_schema: Vec<String>,
    pub misformatted_schema: Vec<String>,
    pub valid: Vec<(String, NodeInfo)>,
}

impl OutcomeGroups {
    pub fn record(&mut self, target: String, outcome: ProbeOutcome) {
        match outcome {
            ProbeOutcome::Unresolved => self.unresolved.push(target),
            ProbeOutcome::NotFunctioning => self.not_functioning.push(target),
            ProbeOutcome::WrongCode(code) => self.wrong_code.push((target, code)),
            ProbeOutcome::MisformattedList => self.misformatted_list.push(target),
            ProbeOutcome::NoAvailableSchema => self.no_available_schema.push(target),
            ProbeOutcome::MisformattedSchema => self.misformatted_schema.push(target),
            ProbeOutcome::Valid(info) => self.valid.push((target, *info)),
        }
    }

    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Unresolved => self.unresolved.len(),
            Category::NotFunctioning => self.not_functioning.len(),
            Category::WrongCode => self.wrong_code.len(),
            Category::MisformattedList => self.misformatted_list.len(),
            Category::NoAvailableSchema => self.no_available_schema.len(),
            Category::MisformattedSchema => self.misformatted_schema.len(),
            Category::Valid => self.valid.len(),
        }
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }

    /// Every target that was recorded, with the category it landed in.
    pub fn iter_targets(&self) -> impl Iterator<Item = (&str, Category)> + '_ {
        fn plain(v: &[String], c: Category) -> impl Iterator<Item = (&str, Category)> + '_ {
            v.iter().map(move |t| (t.as_str(), c))
        }
        plain(&self.unresolved, Category::Unresolved)
            .chain(plain(&self.not_functioning, Category::NotFunctioning))
            .chain(self.wrong_code.iter().map(|(t, _)| (t.as_str(), Category::WrongCode)))
            .chain(plain(&self.misformatted_list, Category::MisformattedList))
            .chain(plain(&self.no_available_schema, Category::NoAvailableSchema))
            .chain(plain(&self.misformatted_schema, Category::MisformattedSchema))
            .chain(self.valid.iter().map(|(t, _)| (t.as_str(), Category::Valid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }

    #[test]
    fn host_strips_port() {
        assert_eq!(Target::from("relay.example").host(), "relay.example");
        assert_eq!(Target::from("relay.example:8443").host(), "relay.example");
        assert_eq!(Target::from("[2001:db8::1]:443").host(), "2001:db8::1");
    }

    #[test]
    fn well_known_keeps_port() {
        assert_eq!(
            Target::from("relay.example:8443").well_known_url(),
            "https://relay.example:8443/.well-known/nodeinfo"
        );
    }

    #[test]
    fn groups_count_every_record() {
        let mut g = OutcomeGroups::default();
        g.record("a".into(), ProbeOutcome::Unresolved);
        g.record("b".into(), ProbeOutcome::WrongCode(503));
        g.record("c".into(), ProbeOutcome::NoAvailableSchema);
        g.record("a".into(), ProbeOutcome::Unresolved);
        assert_eq!(g.total(), 4);
        assert_eq!(g.count(Category::Unresolved), 2);
        assert_eq!(g.wrong_code, vec![("b".to_string(), 503)]);
        let cats: Vec<_> = g.iter_targets().map(|(_, c)| c).collect();
        assert_eq!(cats.len(), 4);
    }
}
