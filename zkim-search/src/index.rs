//! Search Index (§4.4): per-file trapdoor sets, query matching, relevance
//! scoring, access filtering, result padding and per-user rate limiting.

use std::collections::HashMap;
use std::sync::RwLock;

use zkim_core::model::{AccessControl, AccessLevel, Metadata};

use crate::error::{LifecycleError, SearchError};
use crate::oprf::{trapdoor, OprfKey};
use crate::token::{extract_tokens, tokenize_query, IndexInput};

/// One indexed file: its trapdoor set plus the fields needed to filter and
/// rank at query time.
#[derive(Clone)]
struct IndexEntry {
    file_id: String,
    owner_user_id: String,
    trapdoors: Vec<[u8; 32]>,
    file_name: String,
    tags: Vec<String>,
    string_custom_fields: Vec<String>,
    access_control: Option<AccessControl>,
}

pub struct IndexedFile<'a> {
    pub file_id: &'a str,
    pub owner_user_id: &'a str,
    pub metadata: &'a Metadata,
    pub body_preview: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchHit {
    pub file_id: String,
    pub relevance: u32,
}

/// Per-user-per-epoch query quota, reset whenever the epoch rolls.
struct Quota {
    epoch: u64,
    used: u64,
}

pub struct SearchIndex {
    key: OprfKey,
    entries: RwLock<HashMap<String, IndexEntry>>,
    quotas: RwLock<HashMap<String, Quota>>,
    max_queries_per_epoch: u64,
    enable_rate_limiting: bool,
    enable_result_padding: bool,
    bucket_sizes: Vec<usize>,
}

impl SearchIndex {
    pub fn new(
        key: OprfKey,
        max_queries_per_epoch: u64,
        enable_rate_limiting: bool,
        enable_result_padding: bool,
        bucket_sizes: Vec<usize>,
    ) -> Self {
        Self {
            key,
            entries: RwLock::new(HashMap::new()),
            quotas: RwLock::new(HashMap::new()),
            max_queries_per_epoch,
            enable_rate_limiting,
            enable_result_padding,
            bucket_sizes,
        }
    }

    /// `indexFile`: computes trapdoors for the file's token set and
    /// records (or atomically replaces) its entry.
    pub fn index_file(&self, file: &IndexedFile<'_>) {
        let string_custom_fields: Vec<String> =
            file.metadata.custom_fields.strings.values().cloned().collect();
        let tags: Vec<String> = file.metadata.tags.iter().cloned().collect();

        let input = IndexInput {
            file_name: &file.metadata.file_name,
            mime_type: &file.metadata.mime_type,
            tags: &tags,
            string_custom_fields: &string_custom_fields,
            body: file.body_preview,
        };
        let extracted = extract_tokens(&input);
        let trapdoors: Vec<[u8; 32]> = extracted
            .tokens
            .iter()
            .map(|t| trapdoor(&self.key, t))
            .collect();

        let entry = IndexEntry {
            file_id: file.file_id.to_string(),
            owner_user_id: file.owner_user_id.to_string(),
            trapdoors,
            file_name: file.metadata.file_name.clone(),
            tags,
            string_custom_fields,
            access_control: file.metadata.access_control.clone(),
        };

        self.entries.write().unwrap().insert(file.file_id.to_string(), entry);
    }

    pub fn remove_file(&self, file_id: &str) {
        self.entries.write().unwrap().remove(file_id);
    }

    fn check_and_consume_quota(&self, user_id: &str, epoch: u64) -> Result<(), SearchError> {
        if !self.enable_rate_limiting {
            return Ok(());
        }
        let mut quotas = self.quotas.write().unwrap();
        let quota = quotas.entry(user_id.to_string()).or_insert(Quota { epoch, used: 0 });
        if quota.epoch != epoch {
            quota.epoch = epoch;
            quota.used = 0;
        }
        if quota.used >= self.max_queries_per_epoch {
            return Err(LifecycleError::RateLimitExceeded.into());
        }
        quota.used += 1;
        Ok(())
    }

    /// `search(query, limit)`: evaluates the query under the same OPRF
    /// key, filters by access, ranks by relevance, and pads the result
    /// count to the nearest configured bucket size.
    pub fn search(
        &self,
        query: &str,
        querying_user_id: &str,
        limit: usize,
        epoch: u64,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.check_and_consume_quota(querying_user_id, epoch)?;

        let query_token = match tokenize_query(query) {
            Some(t) => t,
            None => return Ok(Vec::new()),
        };
        let query_trapdoor = trapdoor(&self.key, &query_token);

        let entries = self.entries.read().unwrap();
        let mut hits: Vec<SearchHit> = entries
            .values()
            .filter(|entry| {
                AccessControl::access_level_for(entry.access_control.as_ref(), querying_user_id)
                    == AccessLevel::Full
            })
            .filter(|entry| entry.trapdoors.iter().any(|t| *t == query_trapdoor))
            .map(|entry| SearchHit {
                file_id: entry.file_id.clone(),
                relevance: relevance_score(entry, query),
            })
            .collect();

        hits.sort_by(|a, b| b.relevance.cmp(&a.relevance).then_with(|| a.file_id.cmp(&b.file_id)));
        hits.truncate(limit);

        if self.enable_result_padding {
            pad_to_bucket(&mut hits, &self.bucket_sizes);
        }

        Ok(hits)
    }
}

fn relevance_score(entry: &IndexEntry, original_query: &str) -> u32 {
    let needle = original_query.to_lowercase();
    let mut score = 0u32;

    if entry.file_name.to_lowercase().contains(&needle) {
        score += 1;
    }
    for tag in &entry.tags {
        if tag.to_lowercase().contains(&needle) {
            score += 1;
        }
    }
    for field in &entry.string_custom_fields {
        if field.to_lowercase().contains(&needle) {
            score += 1;
            break;
        }
    }
    score
}

/// Pads the visible result count up to the smallest configured bucket
/// size that fits, by appending inert placeholder entries. Placeholders
/// carry no `file_id` a caller could mistake for a real hit. If the true
/// count exceeds every configured bucket, the result is truncated down
/// to the largest bucket instead of leaking the true count.
fn pad_to_bucket(hits: &mut Vec<SearchHit>, bucket_sizes: &[usize]) {
    let Some(&largest) = bucket_sizes.iter().max() else {
        return;
    };
    let target = bucket_sizes.iter().copied().find(|b| *b >= hits.len()).unwrap_or(largest);
    hits.truncate(target);
    while hits.len() < target {
        hits.push(SearchHit { file_id: String::new(), relevance: 0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkim_core::model::AccessControl;
    use std::collections::BTreeSet;

    fn metadata(name: &str, tags: &[&str]) -> Metadata {
        let mut m = Metadata::new(name, "text/plain", 0);
        m.tags = tags.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
        m
    }

    #[test]
    fn indexes_and_finds_by_body_token() {
        let index = SearchIndex::new(OprfKey::generate(), 100, false, false, vec![4, 16]);
        let meta = metadata("notes.txt", &[]);
        index.index_file(&IndexedFile {
            file_id: "f1",
            owner_user_id: "alice",
            metadata: &meta,
            body_preview: "quarterly earnings report",
        });

        let hits = index.search("report", "alice", 10, 0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_id, "f1");
    }

    #[test]
    fn access_control_excludes_other_users() {
        let index = SearchIndex::new(OprfKey::generate(), 100, false, false, vec![4]);
        let mut meta = metadata("secret.txt", &[]);
        meta.access_control = Some(AccessControl {
            read_access: BTreeSet::from(["alice".to_string()]),
            write_access: BTreeSet::new(),
            delete_access: BTreeSet::new(),
        });
        index.index_file(&IndexedFile {
            file_id: "f1",
            owner_user_id: "alice",
            metadata: &meta,
            body_preview: "classified report",
        });

        assert_eq!(index.search("report", "alice", 10, 0).unwrap().len(), 1);
        assert_eq!(index.search("report", "bob", 10, 0).unwrap().len(), 0);
    }

    #[test]
    fn rate_limit_trips_after_quota() {
        let index = SearchIndex::new(OprfKey::generate(), 2, true, false, vec![4]);
        assert!(index.search("anything", "alice", 10, 0).is_ok());
        assert!(index.search("anything", "alice", 10, 0).is_ok());
        assert!(index.search("anything", "alice", 10, 0).is_err());
    }

    #[test]
    fn quota_resets_on_epoch_roll() {
        let index = SearchIndex::new(OprfKey::generate(), 1, true, false, vec![4]);
        assert!(index.search("anything", "alice", 10, 0).is_ok());
        assert!(index.search("anything", "alice", 10, 0).is_err());
        assert!(index.search("anything", "alice", 10, 1).is_ok());
    }

    #[test]
    fn result_padding_rounds_up_to_bucket() {
        let index = SearchIndex::new(OprfKey::generate(), 100, false, true, vec![4, 16]);
        for i in 0..3 {
            let meta = metadata(&format!("file{i}.txt"), &[]);
            index.index_file(&IndexedFile {
                file_id: &format!("f{i}"),
                owner_user_id: "alice",
                metadata: &meta,
                body_preview: "shared keyword",
            });
        }
        let hits = index.search("keyword", "alice", 10, 0).unwrap();
        assert_eq!(hits.len(), 4);
    }

    /// Property 9: counts beyond every configured bucket still pad, to the
    /// largest bucket rather than growing unbounded.
    #[test]
    fn result_padding_uses_largest_bucket_when_count_exceeds_all() {
        let index = SearchIndex::new(OprfKey::generate(), 100, false, true, vec![2, 4]);
        for i in 0..5 {
            let meta = metadata(&format!("file{i}.txt"), &[]);
            index.index_file(&IndexedFile {
                file_id: &format!("f{i}"),
                owner_user_id: "alice",
                metadata: &meta,
                body_preview: "shared keyword",
            });
        }
        let hits = index.search("keyword", "alice", 100, 0).unwrap();
        assert_eq!(hits.len(), 4);
    }

    /// Property 8: exceeding user U's quota never consumes user V's.
    #[test]
    fn rate_limit_is_isolated_per_user() {
        let index = SearchIndex::new(OprfKey::generate(), 1, true, false, vec![4]);
        assert!(index.search("anything", "alice", 10, 0).is_ok());
        assert!(index.search("anything", "alice", 10, 0).is_err());
        assert!(index.search("anything", "bob", 10, 0).is_ok());
    }

    /// No accessControl at all renders a file invisible to search, not
    /// just unreadable (§4.4 access-level derivation).
    #[test]
    fn no_access_control_is_invisible_even_to_owner() {
        let index = SearchIndex::new(OprfKey::generate(), 100, false, false, vec![4]);
        let meta = metadata("plain.txt", &[]);
        index.index_file(&IndexedFile {
            file_id: "f1",
            owner_user_id: "alice",
            metadata: &meta,
            body_preview: "ordinary report",
        });
        assert_eq!(index.search("report", "alice", 10, 0).unwrap().len(), 0);
    }

    #[test]
    fn reindexing_same_file_id_replaces_entry_atomically() {
        let index = SearchIndex::new(OprfKey::generate(), 100, false, false, vec![4]);
        let meta_a = metadata("a.txt", &[]);
        index.index_file(&IndexedFile {
            file_id: "f1",
            owner_user_id: "alice",
            metadata: &meta_a,
            body_preview: "alpha content",
        });
        assert_eq!(index.search("alpha", "alice", 10, 0).unwrap().len(), 1);

        let meta_b = metadata("b.txt", &[]);
        index.index_file(&IndexedFile {
            file_id: "f1",
            owner_user_id: "alice",
            metadata: &meta_b,
            body_preview: "beta content",
        });
        assert_eq!(index.search("alpha", "alice", 10, 0).unwrap().len(), 0);
        assert_eq!(index.search("beta", "alice", 10, 0).unwrap().len(), 1);
    }
}
