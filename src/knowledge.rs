use {
    crate::{simplifying::support::Support, syntax_tree::ltl::Constant},
    indexmap::IndexMap,
    thiserror::Error,
};

/// The knowledge source consulted at predicate leaves: for a predicate
/// instance, the positions where it is known true and known false. Positions
/// in neither set are unknown. A name the oracle has never heard of answers
/// with no information.
pub trait Oracle {
    fn check(&mut self, predicate: &str, constants: &[Constant]) -> Support;
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum KnowledgeError {
    #[error("predicate `{0}` is already registered")]
    DuplicateRegistration(String),
}

type Source = Box<dyn Fn(&[String]) -> Support>;

struct Registration {
    arity: usize,
    source: Source,
    /// The first answer this predicate ever gave. When it pins the predicate
    /// everywhere true or everywhere false, later lookups short-circuit
    /// without consulting the source again.
    universal: Option<Support>,
    memo: IndexMap<Vec<String>, Support>,
}

/// A registry of predicate sources with memoization, the stock [`Oracle`]
/// implementation.
#[derive(Default)]
pub struct Knowledge {
    predicates: IndexMap<String, Registration>,
}

impl Knowledge {
    pub fn new() -> Self {
        Knowledge::default()
    }

    pub fn register(
        &mut self,
        predicate: &str,
        arity: usize,
        source: impl Fn(&[String]) -> Support + 'static,
    ) -> Result<(), KnowledgeError> {
        if self.predicates.contains_key(predicate) {
            return Err(KnowledgeError::DuplicateRegistration(predicate.into()));
        }

        self.predicates.insert(
            predicate.into(),
            Registration {
                arity,
                source: Box::new(source),
                universal: None,
                memo: IndexMap::new(),
            },
        );
        Ok(())
    }
}

impl Oracle for Knowledge {
    fn check(&mut self, predicate: &str, constants: &[Constant]) -> Support {
        let Some(registration) = self.predicates.get_mut(predicate) else {
            log::debug!("unregistered predicate `{predicate}`");
            return Support::unknown();
        };

        assert_eq!(
            registration.arity,
            constants.len(),
            "predicate `{predicate}` expects {} arguments",
            registration.arity
        );

        if let Some(universal) = &registration.universal {
            if universal.truth.is_all() || universal.falsity.is_all() {
                return universal.clone();
            }
        }

        let names: Vec<String> = constants
            .iter()
            .map(|constant| constant.name.clone())
            .collect();

        if let Some(known) = registration.memo.get(&names) {
            return known.clone();
        }

        let support = (registration.source)(&names);
        log::debug!(
            "predicate `{predicate}({})`: true in {}, false in {}",
            names.join(", "),
            support.truth,
            support.falsity
        );
        registration.universal.get_or_insert_with(|| support.clone());
        registration.memo.insert(names, support.clone());
        support
    }
}
