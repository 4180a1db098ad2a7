//! Seed data: the directory skeleton used when nothing else is available.

use std::path::PathBuf;

use campdir_types::Tree;

use crate::error::SeedError;

/// Bundled seed tree.
pub const EMBEDDED_SEED: &str = include_str!("../../../assets/seed/regions.json");

/// Where seed data comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SeedSource {
    /// The bundled `regions.json`.
    #[default]
    Embedded,
    /// A JSON file on disk.
    File(PathBuf),
    /// A JSON document fetched with HTTP GET.
    Http(String),
    /// A tree supplied directly, for tests.
    Inline(Tree),
}

impl SeedSource {
    /// Load the seed, propagating failures.
    pub async fn try_load(&self) -> Result<Tree, SeedError> {
        match self {
            SeedSource::Embedded => Ok(serde_json::from_str(EMBEDDED_SEED)?),
            SeedSource::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                Ok(serde_json::from_slice(&bytes)?)
            }
            SeedSource::Http(url) => {
                let tree = reqwest::get(url)
                    .await?
                    .error_for_status()?
                    .json::<Tree>()
                    .await?;
                Ok(tree)
            }
            SeedSource::Inline(tree) => Ok(tree.clone()),
        }
    }

    /// Load the seed. Any failure yields an empty tree.
    pub async fn load(&self) -> Tree {
        match self.try_load().await {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!(source = ?self, error = %e, "failed to load seed data");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campdir_types::RegionKind;

    #[tokio::test]
    async fn test_embedded_seed_parses() {
        let tree = SeedSource::Embedded.try_load().await.unwrap();
        let pouroshova = tree
            .iter()
            .find(|r| r.id == "region-satkania-pouroshova")
            .expect("pouroshova in seed");
        match &pouroshova.kind {
            RegionKind::Wards(wards) => {
                assert_eq!(wards.len(), 1);
                assert_eq!(wards[0].name, "Ward-1");
                assert!(wards[0].persons.is_empty());
            }
            RegionKind::Unions(_) => panic!("pouroshova must hold wards directly"),
        }
        assert!(tree.iter().any(|r| r.has_unions()));
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_empty() {
        let source = SeedSource::File(PathBuf::from("/nonexistent/campdir/regions.json"));
        assert!(source.try_load().await.is_err());
        assert!(source.load().await.is_empty());
    }
}
