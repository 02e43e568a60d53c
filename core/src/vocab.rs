use crate::error::{RecError, Result};
use crate::similarity::FeatureVector;
use crate::tokenizer::tokenize;
use crate::{ItemId, TermId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Term dictionary with indices assigned in ascending lexicographic order.
/// Serializes as the term list, whose positions are the indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    #[serde(skip)]
    dictionary: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn get(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn term(&self, id: TermId) -> Option<&str> { self.terms.get(id as usize).map(String::as_str) }

    /// (term, index) pairs in index order, which is also alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TermId)> + '_ {
        self.terms.iter().enumerate().map(|(i, t)| (t.as_str(), i as TermId))
    }
}

/// Pass 1: collect distinct terms and index them alphabetically.
pub fn build_vocabulary(docs: &[Vec<String>]) -> Vocabulary {
    let distinct: BTreeSet<&str> = docs.iter().flatten().map(String::as_str).collect();
    let terms: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    let dictionary = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as TermId)).collect();
    Vocabulary { terms, dictionary }
}

/// Pass 2: raw term counts for one document. Terms outside the vocabulary are ignored.
pub fn term_frequencies(vocab: &Vocabulary, tokens: &[String]) -> BTreeMap<TermId, u32> {
    let mut tf: BTreeMap<TermId, u32> = BTreeMap::new();
    for token in tokens {
        if let Some(tid) = vocab.get(token) {
            *tf.entry(tid).or_insert(0) += 1;
        }
    }
    tf
}

/// Largest term count in a document; `None` for a document with no tokens.
pub fn max_term_frequency(tf: &BTreeMap<TermId, u32>) -> Option<u32> {
    tf.values().copied().max()
}

/// Pass 3: number of documents containing each term.
pub fn document_frequencies(vocab: &Vocabulary, tfs: &[BTreeMap<TermId, u32>]) -> Vec<u32> {
    let mut df = vec![0u32; vocab.len()];
    for tf in tfs {
        for tid in tf.keys() {
            df[*tid as usize] += 1;
        }
    }
    df
}

/// Pass 4: weight(i, d) = tf(i, d) / maxtf(d) * log10(N / df(i)).
pub fn tfidf_weights(tf: &BTreeMap<TermId, u32>, df: &[u32], num_docs: usize) -> FeatureVector {
    let dim = df.len();
    let max_tf = match max_term_frequency(tf) {
        Some(m) if m > 0 => m as f64,
        _ => return FeatureVector::zeros(dim),
    };
    let n = num_docs as f64;
    let pairs = tf.iter().filter_map(|(tid, count)| {
        let df_t = *df.get(*tid as usize)?;
        if df_t == 0 {
            return None;
        }
        let idf = (n / df_t as f64).log10();
        Some((*tid, (*count as f64 / max_tf) * idf))
    });
    FeatureVector::from_pairs(dim, pairs)
}

#[derive(Debug, Clone)]
pub struct ItemMeta {
    pub item_id: ItemId,
    pub text: String,
    pub tokens: Vec<String>,
}

/// Item arena: each item gets a dense slot at ingestion and every derived
/// table (tokens, vectors) is indexed by that slot.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    pub vocabulary: Vocabulary,
    pub df: Vec<u32>,
    pub items: Vec<ItemMeta>,
    pub features: Vec<FeatureVector>,
    by_id: HashMap<ItemId, usize>,
}

impl FeatureIndex {
    /// Tokenize and vectorize every item.
    pub fn build<I, S>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ItemId, S)>,
        S: Into<String>,
    {
        let mut items: Vec<ItemMeta> = Vec::new();
        let mut by_id: HashMap<ItemId, usize> = HashMap::new();
        for (item_id, text) in records {
            let text: String = text.into();
            if by_id.insert(item_id, items.len()).is_some() {
                return Err(RecError::DuplicateItem(item_id));
            }
            let tokens = tokenize(&text);
            items.push(ItemMeta { item_id, text, tokens });
        }

        let docs: Vec<Vec<String>> = items.iter().map(|m| m.tokens.clone()).collect();
        let vocabulary = build_vocabulary(&docs);
        let tfs: Vec<BTreeMap<TermId, u32>> = docs.iter().map(|d| term_frequencies(&vocabulary, d)).collect();
        let df = document_frequencies(&vocabulary, &tfs);
        let features: Vec<FeatureVector> = tfs.iter().map(|tf| tfidf_weights(tf, &df, items.len())).collect();

        let empty = features.iter().filter(|f| f.is_zero()).count();
        tracing::info!(num_items = items.len(), num_terms = vocabulary.len(), zero_vectors = empty, "built feature index");

        Ok(Self { vocabulary, df, items, features, by_id })
    }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Dense slot for an item id.
    pub fn slot(&self, item_id: ItemId) -> Result<usize> {
        self.by_id.get(&item_id).copied().ok_or(RecError::UnknownItem(item_id))
    }

    pub fn vector(&self, item_id: ItemId) -> Result<&FeatureVector> {
        let slot = self.slot(item_id)?;
        Ok(&self.features[slot])
    }

    pub fn vector_at(&self, slot: usize) -> &FeatureVector { &self.features[slot] }
}
