//! Entity-to-response mapping.

/// Maps a domain entity to its wire representation.
///
/// Mappers are pure and total: no I/O, no failure path. Anything that can
/// fail belongs in the service; anything transport-shaped (public URLs
/// derived from storage keys, field renames) belongs here, configured up
/// front.
pub trait Mapper<E, Res>: Send + Sync + 'static {
    /// Maps one entity.
    fn map(&self, entity: &E) -> Res;
}

impl<E, Res, F> Mapper<E, Res> for F
where
    F: Fn(&E) -> Res + Send + Sync + 'static,
{
    fn map(&self, entity: &E) -> Res {
        self(entity)
    }
}

/// The identity mapper, for entities that already are their wire shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl<E: Clone + Send + Sync + 'static> Mapper<E, E> for IdentityMapper {
    fn map(&self, entity: &E) -> E {
        entity.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        id: String,
        attachment_key: Option<String>,
    }

    #[test]
    fn test_closure_mapper_resolves_references() {
        let base_url = "https://files.example.com".to_string();
        let mapper = move |note: &Note| {
            serde_json::json!({
                "id": note.id,
                "attachmentUrl": note
                    .attachment_key
                    .as_ref()
                    .map(|key| format!("{base_url}/{key}")),
            })
        };

        let note = Note {
            id: "n1".to_string(),
            attachment_key: Some("a/b.png".to_string()),
        };
        let res = Mapper::map(&mapper, &note);
        assert_eq!(res["attachmentUrl"], "https://files.example.com/a/b.png");
    }

    #[test]
    fn test_identity_mapper_clones() {
        let mapped: i32 = IdentityMapper.map(&7);
        assert_eq!(mapped, 7);
    }
}
