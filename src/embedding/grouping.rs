use super::{EmbeddedNode, EmbeddingConfig, EmbeddingError, EmbeddingKinematics};
use crate::model::element::HostElement;
use crate::model::node::Node;
use crate::model::{DofEnumerator, Model, ModelError};

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "json_export")]
use std::fs::File;
#[cfg(feature = "json_export")]
use std::io::BufWriter;

/// Ties the extra (interface) Nodes of a group of embedded Elements to a group of host Elements.
///
/// Only the Nodes beyond each embedded Element's structural Node count are embedded, so that
/// the structural Nodes stay free to slip relative to the host (bond-slip / debonding).
///
/// Construction validates both groups and plans the full embedding pass. The Model is not mutated;
/// the planned mutations are available through [`result`](Self::result) and must be applied by the
/// caller with [`EmbeddingResult::apply`].
///
/// When a Node lies inside more than one host (ex: on a shared face), hosts are tried in the order
/// of the host group and the first one wins on every Element; the others are counted as skipped duplicates.
#[derive(Debug, Clone)]
pub struct EmbeddedCohesiveGrouping {
    host_group: Vec<usize>,
    embedded_group: Vec<usize>,
    config: EmbeddingConfig,
    result: EmbeddingResult,
}

impl EmbeddedCohesiveGrouping {
    pub fn new(
        model: &Model,
        host_group: &[usize],
        embedded_group: &[usize],
        config: EmbeddingConfig,
    ) -> Result<Self, EmbeddingError> {
        Self::build(model, host_group, embedded_group, config, false)
    }

    /// Same as `new`, except the host containment queries are run in parallel using the Rayon Global ThreadPool
    ///
    /// The planned result is identical to the one produced by `new`.
    pub fn new_parallel(
        model: &Model,
        host_group: &[usize],
        embedded_group: &[usize],
        config: EmbeddingConfig,
    ) -> Result<Self, EmbeddingError> {
        Self::build(model, host_group, embedded_group, config, true)
    }

    fn build(
        model: &Model,
        host_group: &[usize],
        embedded_group: &[usize],
        config: EmbeddingConfig,
        parallel: bool,
    ) -> Result<Self, EmbeddingError> {
        let distinct_hosts = distinct(host_group);
        let distinct_embedded = distinct(embedded_group);

        let hosts = validate_host_group(model, &distinct_hosts)?;
        validate_embedded_group(model, &distinct_embedded)?;

        let result = Planner::new(model, &distinct_embedded, config).plan(&hosts, parallel)?;

        tracing::debug!(
            "Planned {} embedded Nodes on {} Elements ({} hosts, {} embedded Elements, {} kinematics, {} duplicates skipped)",
            result.num_embedded_nodes(),
            result.num_updated_elements(),
            distinct_hosts.len(),
            distinct_embedded.len(),
            config.kinematics,
            result.skipped_duplicates,
        );

        Ok(Self {
            host_group: host_group.to_vec(),
            embedded_group: embedded_group.to_vec(),
            config,
            result,
        })
    }

    /// The host group as it was given (repeated IDs are only ignored while planning)
    pub fn host_group(&self) -> &[usize] {
        &self.host_group
    }

    /// The embedded group as it was given (repeated IDs are only ignored while planning)
    pub fn embedded_group(&self) -> &[usize] {
        &self.embedded_group
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    pub fn result(&self) -> &EmbeddingResult {
        &self.result
    }

    pub fn into_result(self) -> EmbeddingResult {
        self.result
    }
}

/// Validate the groups, plan the embedding, and apply it to the Model in one step
pub fn apply_embedding(
    model: &mut Model,
    host_group: &[usize],
    embedded_group: &[usize],
    config: EmbeddingConfig,
) -> Result<EmbeddingResult, EmbeddingError> {
    let result =
        EmbeddedCohesiveGrouping::new(model, host_group, embedded_group, config)?.into_result();
    result.apply(model)?;
    Ok(result)
}

/// The mutations planned for a single Element
#[derive(Debug, Clone)]
pub struct ElementUpdate {
    pub element_id: usize,
    /// New embedded Nodes (none of which are already present on the Element)
    pub embedded_nodes: Vec<EmbeddedNode>,
    /// Replacement DoF enumerator, if the Element's enumerator should change
    pub dof_enumerator: Option<DofEnumerator>,
}

impl ElementUpdate {
    fn new(element_id: usize) -> Self {
        Self {
            element_id,
            embedded_nodes: Vec::new(),
            dof_enumerator: None,
        }
    }

    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let embedded_nodes: Vec<JsonValue> =
            self.embedded_nodes.iter().map(|en| en.to_json()).collect();
        let dof_enumerator: Option<String> = self.dof_enumerator.map(|de| de.to_string());

        object! {
            "element_id": self.element_id,
            "embedded_nodes": embedded_nodes,
            "dof_enumerator": dof_enumerator,
        }
    }
}

/// The complete set of mutations produced by a grouping run, keyed by Element ID
#[derive(Debug, Clone, Default)]
pub struct EmbeddingResult {
    pub kinematics: EmbeddingKinematics,
    updates: BTreeMap<usize, ElementUpdate>,
    /// Number of embeddings which were discarded because the Node was already embedded on that Element
    pub skipped_duplicates: usize,
}

impl EmbeddingResult {
    fn new(kinematics: EmbeddingKinematics) -> Self {
        Self {
            kinematics,
            ..Default::default()
        }
    }

    /// Iterate over the planned updates (ordered by Element ID)
    pub fn updates(&self) -> impl Iterator<Item = &ElementUpdate> + '_ {
        self.updates.values()
    }

    pub fn update_for(&self, element_id: usize) -> Option<&ElementUpdate> {
        self.updates.get(&element_id)
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn num_updated_elements(&self) -> usize {
        self.updates.len()
    }

    /// Total number of (Element, EmbeddedNode) pairs to be added
    pub fn num_embedded_nodes(&self) -> usize {
        self.updates.values().map(|u| u.embedded_nodes.len()).sum()
    }

    /// Apply the planned mutations to the Model. Returns the number of embedded Nodes actually added.
    ///
    /// Embedded Nodes already present on an Element are not added twice, so applying a result again is harmless.
    pub fn apply(&self, model: &mut Model) -> Result<usize, ModelError> {
        let mut num_added = 0;

        for update in self.updates.values() {
            let element = model
                .element_mut(update.element_id)
                .ok_or(ModelError::ElementDoesntExist(update.element_id))?;

            for embedded_node in update.embedded_nodes.iter() {
                if element.push_embedded_node(embedded_node.clone()) {
                    num_added += 1;
                }
            }

            if let Some(dof_enumerator) = update.dof_enumerator {
                element.set_dof_enumerator(dof_enumerator);
            }
        }

        tracing::info!(
            "Applied {} embedded Nodes to {} Elements",
            num_added,
            self.updates.len()
        );

        Ok(num_added)
    }

    /// Produce a Json Object that describes this EmbeddingResult
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let updates: Vec<JsonValue> = self.updates.values().map(|u| u.to_json()).collect();

        object! {
            "kinematics": self.kinematics.to_string(),
            "skipped_duplicates": self.skipped_duplicates,
            "updates": updates,
        }
    }

    /// Print the result to a JSON file specified by path.
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);

        self.to_json().write_pretty(&mut w, 4)?;

        Ok(())
    }
}

// A validated host Element along with its Nodes
struct Host<'m> {
    id: usize,
    element: &'m dyn HostElement,
    nodes: SmallVec<[&'m Node; 8]>,
}

impl<'m> Host<'m> {
    fn try_embed(&self, candidate: &Node, config: &EmbeddingConfig) -> Option<EmbeddedNode> {
        let embedded = self
            .element
            .build_host_embedded_node(self.id, &self.nodes, candidate, config);

        if embedded.is_none() {
            tracing::trace!("Node {} is not inside host Element {}", candidate.id, self.id);
        }

        embedded
    }
}

fn validate_host_group<'m>(
    model: &'m Model,
    host_group: &[usize],
) -> Result<Vec<Host<'m>>, EmbeddingError> {
    host_group
        .iter()
        .map(|id| -> Result<Host<'m>, EmbeddingError> {
            let element = model
                .element(*id)
                .ok_or(EmbeddingError::ElementDoesntExist(*id))?;
            let host = element
                .element()
                .as_host()
                .ok_or(EmbeddingError::NotHostElement(*id))?;

            Ok(Host {
                id: *id,
                element: host,
                nodes: model.element_nodes(*id)?,
            })
        })
        .collect()
}

fn validate_embedded_group(model: &Model, embedded_group: &[usize]) -> Result<(), EmbeddingError> {
    embedded_group.iter().try_for_each(|id| {
        model
            .element(*id)
            .ok_or(EmbeddingError::ElementDoesntExist(*id))?
            .element()
            .as_embedded()
            .map(|_| ())
            .ok_or(EmbeddingError::NotEmbeddedElement(*id))
    })
}

// remove repeated IDs, keeping the first occurrence
fn distinct(ids: &[usize]) -> Vec<usize> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

struct Planner<'a> {
    model: &'a Model,
    embedded_group: &'a [usize],
    config: EmbeddingConfig,
    // Node ID -> embeddable Elements outside of the embedded group containing that Node
    outside_elements: BTreeMap<usize, SmallVec<[usize; 4]>>,
    result: EmbeddingResult,
}

impl<'a> Planner<'a> {
    fn new(model: &'a Model, embedded_group: &'a [usize], config: EmbeddingConfig) -> Self {
        let embedded_set: BTreeSet<usize> = embedded_group.iter().copied().collect();

        let mut outside_elements: BTreeMap<usize, SmallVec<[usize; 4]>> = BTreeMap::new();
        for subdomain in model.subdomains() {
            for element in subdomain
                .element_ids()
                .iter()
                .filter(|id| !embedded_set.contains(*id))
                .filter_map(|id| model.element(*id))
                .filter(|element| element.element().as_embedded().is_some())
            {
                for node_id in element.node_ids() {
                    let elements = outside_elements.entry(*node_id).or_default();
                    if !elements.contains(&element.id) {
                        elements.push(element.id);
                    }
                }
            }
        }

        Self {
            model,
            embedded_group,
            config,
            outside_elements,
            result: EmbeddingResult::new(config.kinematics),
        }
    }

    fn plan(
        mut self,
        hosts: &[Host<'_>],
        parallel: bool,
    ) -> Result<EmbeddingResult, EmbeddingError> {
        let model = self.model;
        let cohesive = DofEnumerator::Cohesive(self.config.kinematics);

        for &embedded_id in self.embedded_group {
            let model_element = model
                .element(embedded_id)
                .ok_or(EmbeddingError::ElementDoesntExist(embedded_id))?;
            let embedded_element = model_element
                .element()
                .as_embedded()
                .ok_or(EmbeddingError::NotEmbeddedElement(embedded_id))?;

            for node_id in embedded_element.extra_node_ids() {
                let node = model.node(*node_id).ok_or(ModelError::NodeDoesntExist {
                    element_id: embedded_id,
                    node_id: *node_id,
                })?;

                for embedded_node in self.locate(hosts, node, parallel) {
                    if !self.add_embedded_node(embedded_id, &embedded_node) {
                        self.result.skipped_duplicates += 1;
                        tracing::debug!(
                            "Node {} of Element {} is already embedded; skipping host Element {}",
                            node_id,
                            embedded_id,
                            embedded_node.host_element_id
                        );
                    }

                    // keep Elements outside of the groups that share this Node consistent
                    let outside: SmallVec<[usize; 4]> = self
                        .outside_elements
                        .get(&embedded_node.node_id)
                        .cloned()
                        .unwrap_or_default();

                    for other_id in outside {
                        if self.add_embedded_node(other_id, &embedded_node) {
                            self.set_dof_enumerator(other_id, cohesive);
                        }
                    }
                }
            }

            if self.has_any_embedded_node(embedded_id) {
                self.set_dof_enumerator(embedded_id, cohesive);
            }
        }

        Ok(self.result)
    }

    // query every host for the Node, in host group order
    fn locate(&self, hosts: &[Host<'_>], node: &Node, parallel: bool) -> Vec<EmbeddedNode> {
        let config = &self.config;
        if parallel {
            hosts
                .par_iter()
                .filter_map(|host| host.try_embed(node, config))
                .collect()
        } else {
            hosts
                .iter()
                .filter_map(|host| host.try_embed(node, config))
                .collect()
        }
    }

    fn has_embedded_node(&self, element_id: usize, node_id: usize) -> bool {
        self.model
            .element(element_id)
            .map_or(false, |e| e.has_embedded_node(node_id))
            || self.result.updates.get(&element_id).map_or(false, |u| {
                u.embedded_nodes.iter().any(|en| en.node_id == node_id)
            })
    }

    fn has_any_embedded_node(&self, element_id: usize) -> bool {
        self.model
            .element(element_id)
            .map_or(false, |e| !e.embedded_nodes().is_empty())
            || self
                .result
                .updates
                .get(&element_id)
                .map_or(false, |u| !u.embedded_nodes.is_empty())
    }

    // returns false if the Element already has (or is already planned to get) an EmbeddedNode for this Node
    fn add_embedded_node(&mut self, element_id: usize, embedded_node: &EmbeddedNode) -> bool {
        if self.has_embedded_node(element_id, embedded_node.node_id) {
            return false;
        }

        self.result
            .updates
            .entry(element_id)
            .or_insert_with(|| ElementUpdate::new(element_id))
            .embedded_nodes
            .push(embedded_node.clone());
        true
    }

    fn set_dof_enumerator(&mut self, element_id: usize, dof_enumerator: DofEnumerator) {
        self.result
            .updates
            .entry(element_id)
            .or_insert_with(|| ElementUpdate::new(element_id))
            .dof_enumerator = Some(dof_enumerator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cohesive::CohesiveInterface;
    use crate::model::element::FiniteElement;
    use crate::model::hexa8::{Hexa8, HEXA8_NODE_NATURAL};
    use crate::model::node::Dof;
    use nalgebra::Vector3;

    /// An Element with neither host nor embedded capabilities
    #[derive(Debug)]
    struct Spring {
        nodes: [usize; 2],
    }

    impl FiniteElement for Spring {
        fn type_name(&self) -> &'static str {
            "Spring"
        }

        fn node_ids(&self) -> &[usize] {
            &self.nodes
        }

        fn node_dofs(&self, _: usize) -> SmallVec<[Dof; 6]> {
            SmallVec::from_slice(&Dof::TRANSLATIONS)
        }
    }

    fn cube_nodes(first_id: usize, origin: [f64; 3], size: f64) -> Vec<Node> {
        HEXA8_NODE_NATURAL
            .iter()
            .enumerate()
            .map(|(i, nat)| {
                Node::at(
                    first_id + i,
                    [
                        origin[0] + size * (nat[0] + 1.0) / 2.0,
                        origin[1] + size * (nat[1] + 1.0) / 2.0,
                        origin[2] + size * (nat[2] + 1.0) / 2.0,
                    ],
                )
            })
            .collect()
    }

    fn ids(first_id: usize) -> [usize; 8] {
        [0, 1, 2, 3, 4, 5, 6, 7].map(|i| first_id + i)
    }

    /*
        Element 0: Hexa8 host over [0, 1]^3 (Nodes 0..8)
        Element 1: CohesiveInterface with structural Nodes 100..108 (inside the host) and extra Node 200
    */
    fn single_host_model(extra: [f64; 3]) -> Model {
        let mut model = Model::blank();
        model.add_subdomain(0).unwrap();
        model.add_nodes(cube_nodes(0, [0.0; 3], 1.0)).unwrap();
        model.add_nodes(cube_nodes(100, [0.25; 3], 0.5)).unwrap();
        model.add_node(Node::at(200, extra)).unwrap();

        model.add_element(0, 0, Hexa8::new(ids(0))).unwrap();
        model
            .add_element(
                1,
                0,
                CohesiveInterface::new((100..108).chain([200]).collect()).unwrap(),
            )
            .unwrap();
        model
    }

    fn embedded_pairs(result: &EmbeddingResult) -> Vec<(usize, usize, usize)> {
        result
            .updates()
            .flat_map(|u| {
                u.embedded_nodes
                    .iter()
                    .map(move |en| (u.element_id, en.node_id, en.host_element_id))
            })
            .collect()
    }

    #[test]
    fn node_at_cube_center() {
        let mut model = single_host_model([0.5, 0.5, 0.5]);
        let grouping =
            EmbeddedCohesiveGrouping::new(&model, &[0], &[1], EmbeddingConfig::default())
                .unwrap();

        assert_eq!(grouping.host_group(), &[0]);
        assert_eq!(grouping.embedded_group(), &[1]);

        let result = grouping.result();
        assert_eq!(embedded_pairs(result), vec![(1, 200, 0)]);
        assert!(result.update_for(0).is_none());
        assert_eq!(
            result.update_for(1).unwrap().dof_enumerator,
            Some(DofEnumerator::Cohesive(EmbeddingKinematics::TranslationOnly))
        );

        // planning leaves the model untouched
        assert!(model.element(1).unwrap().embedded_nodes().is_empty());
        assert_eq!(result.apply(&mut model).unwrap(), 1);

        let element = model.element(1).unwrap();
        assert_eq!(
            element.dof_enumerator(),
            DofEnumerator::Cohesive(EmbeddingKinematics::TranslationOnly)
        );
        let embedded = element.embedded_node(200).unwrap();
        assert_eq!(embedded.host_element_id, 0);
        assert!(embedded.natural_coordinates.norm() < 1e-12);
        assert_eq!(embedded.transformation.coefficients.shape(), (3, 24));
        for a in 0..8 {
            for axis in 0..3 {
                assert!(
                    (embedded.transformation.coefficients[(axis, 3 * a + axis)] - 0.125).abs()
                        < 1e-14
                );
            }
        }

        // the host is not embeddable and is never touched
        let host = model.element(0).unwrap();
        assert!(host.embedded_nodes().is_empty());
        assert_eq!(host.dof_enumerator(), DofEnumerator::Generic);

        // 8 free structural Nodes + the 8 host Nodes
        let embedder = model.element_embedder(1).unwrap();
        assert_eq!(embedder.superelement_dofs().len(), 48);
        assert!(!embedder
            .superelement_dofs()
            .iter()
            .any(|sd| sd.node_id == 200));
    }

    #[test]
    fn node_outside_host() {
        let mut model = single_host_model([5.0, 5.0, 5.0]);
        let result = apply_embedding(&mut model, &[0], &[1], EmbeddingConfig::default()).unwrap();

        assert!(result.is_empty());
        let element = model.element(1).unwrap();
        assert!(element.embedded_nodes().is_empty());
        assert_eq!(element.dof_enumerator(), DofEnumerator::Generic);
    }

    #[test]
    fn structural_nodes_are_never_embedded() {
        // all 8 structural Nodes lie inside the host
        let mut model = single_host_model([0.5, 0.5, 0.5]);
        apply_embedding(&mut model, &[0], &[1], EmbeddingConfig::default()).unwrap();

        let element = model.element(1).unwrap();
        for node_id in 100..108 {
            assert!(!element.has_embedded_node(node_id));
        }
        assert_eq!(element.embedded_nodes().len(), 1);
    }

    #[test]
    fn capability_gating() {
        let model = single_host_model([0.5, 0.5, 0.5]);
        let config = EmbeddingConfig::default();

        assert_eq!(
            EmbeddedCohesiveGrouping::new(&model, &[0, 1], &[1], config).unwrap_err(),
            EmbeddingError::NotHostElement(1)
        );
        assert_eq!(
            EmbeddedCohesiveGrouping::new(&model, &[0], &[0], config).unwrap_err(),
            EmbeddingError::NotEmbeddedElement(0)
        );
        // the host group is validated first
        assert_eq!(
            EmbeddedCohesiveGrouping::new(&model, &[1], &[0], config).unwrap_err(),
            EmbeddingError::NotHostElement(1)
        );
        assert_eq!(
            EmbeddedCohesiveGrouping::new(&model, &[0], &[9], config).unwrap_err(),
            EmbeddingError::ElementDoesntExist(9)
        );
    }

    #[test]
    fn failed_validation_leaves_model_untouched() {
        let mut model = single_host_model([0.5, 0.5, 0.5]);
        model.add_node(Node::at(300, [0.1, 0.1, 0.1])).unwrap();
        model.add_element(2, 0, Spring { nodes: [200, 300] }).unwrap();

        assert_eq!(
            apply_embedding(&mut model, &[0, 2], &[1], EmbeddingConfig::default()).unwrap_err(),
            EmbeddingError::NotHostElement(2)
        );
        assert!(model.elements().all(|e| e.embedded_nodes().is_empty()
            && e.dof_enumerator() == DofEnumerator::Generic));
    }

    #[test]
    fn shared_nodes_propagate_to_outside_elements() {
        let mut model = single_host_model([0.5, 0.5, 0.5]);
        model.add_subdomain(1).unwrap();
        model.add_nodes(cube_nodes(300, [5.0; 3], 1.0)).unwrap();

        // embeddable, but outside of both groups and in another subdomain
        model
            .add_element(
                3,
                1,
                CohesiveInterface::new((300..308).chain([200]).collect()).unwrap(),
            )
            .unwrap();
        // shares the Node, but is not embeddable
        model.add_element(4, 1, Spring { nodes: [200, 300] }).unwrap();

        let result = apply_embedding(&mut model, &[0], &[1], EmbeddingConfig::default()).unwrap();
        assert_eq!(embedded_pairs(&result), vec![(1, 200, 0), (3, 200, 0)]);

        let outside = model.element(3).unwrap();
        assert_eq!(outside.embedded_node(200).unwrap().host_element_id, 0);
        assert_eq!(
            outside.dof_enumerator(),
            DofEnumerator::Cohesive(EmbeddingKinematics::TranslationOnly)
        );

        let spring = model.element(4).unwrap();
        assert!(spring.embedded_nodes().is_empty());
        assert_eq!(spring.dof_enumerator(), DofEnumerator::Generic);
    }

    #[test]
    fn rerun_adds_nothing() {
        let mut model = single_host_model([0.5, 0.5, 0.5]);
        model.add_nodes(cube_nodes(300, [5.0; 3], 1.0)).unwrap();
        model
            .add_element(
                3,
                0,
                CohesiveInterface::new((300..308).chain([200]).collect()).unwrap(),
            )
            .unwrap();

        let config = EmbeddingConfig::default();
        let first = apply_embedding(&mut model, &[0], &[1], config).unwrap();
        assert_eq!(first.num_embedded_nodes(), 2);

        let snapshot: Vec<(usize, usize, usize)> = model
            .elements()
            .flat_map(|e| {
                e.embedded_nodes()
                    .iter()
                    .map(move |en| (e.id, en.node_id, en.host_element_id))
            })
            .collect();

        let second = EmbeddedCohesiveGrouping::new(&model, &[0], &[1], config)
            .unwrap()
            .into_result();
        assert_eq!(second.num_embedded_nodes(), 0);
        assert_eq!(second.skipped_duplicates, 1);
        assert_eq!(second.apply(&mut model).unwrap(), 0);

        let after: Vec<(usize, usize, usize)> = model
            .elements()
            .flat_map(|e| {
                e.embedded_nodes()
                    .iter()
                    .map(move |en| (e.id, en.node_id, en.host_element_id))
            })
            .collect();
        assert_eq!(snapshot, after);

        // applying the same result twice is also harmless
        assert_eq!(first.apply(&mut model).unwrap(), 0);
        assert_eq!(model.element(1).unwrap().embedded_nodes().len(), 1);
    }

    #[test]
    fn reset_and_rerun() {
        let mut model = single_host_model([0.5, 0.5, 0.5]);
        let config = EmbeddingConfig::default();
        apply_embedding(&mut model, &[0], &[1], config).unwrap();

        model.reset_embedding();
        assert!(model.element(1).unwrap().embedded_nodes().is_empty());
        assert_eq!(
            model.element(1).unwrap().dof_enumerator(),
            DofEnumerator::Generic
        );

        let result = apply_embedding(&mut model, &[0], &[1], config).unwrap();
        assert_eq!(result.num_embedded_nodes(), 1);
    }

    #[test]
    fn shared_face_tie_break() {
        // two hosts sharing the x = 1 face; Node 200 lies on that face
        let mut model = single_host_model([1.0, 0.5, 0.5]);
        model.add_nodes(cube_nodes(10, [1.0, 0.0, 0.0], 1.0)).unwrap();
        model.add_element(2, 0, Hexa8::new(ids(10))).unwrap();

        let config = EmbeddingConfig::default();

        let result = EmbeddedCohesiveGrouping::new(&model, &[0, 2], &[1], config)
            .unwrap()
            .into_result();
        assert_eq!(embedded_pairs(&result), vec![(1, 200, 0)]);
        assert_eq!(result.skipped_duplicates, 1);

        let result = EmbeddedCohesiveGrouping::new(&model, &[2, 0], &[1], config)
            .unwrap()
            .into_result();
        assert_eq!(embedded_pairs(&result), vec![(1, 200, 2)]);
        let embedded = &result.update_for(1).unwrap().embedded_nodes[0];
        assert!((embedded.natural_coordinates.x + 1.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_group_entries() {
        let model = single_host_model([0.5, 0.5, 0.5]);
        let grouping = EmbeddedCohesiveGrouping::new(
            &model,
            &[0, 0],
            &[1, 1],
            EmbeddingConfig::default(),
        )
        .unwrap();

        assert_eq!(grouping.host_group(), &[0, 0]);
        assert_eq!(grouping.embedded_group(), &[1, 1]);
        assert_eq!(grouping.result().num_embedded_nodes(), 1);
        assert_eq!(grouping.result().skipped_duplicates, 0);
    }

    #[test]
    fn node_far_from_origin() {
        for offset in [1e5, 1e6] {
            let mut model = Model::blank();
            model.add_subdomain(0).unwrap();
            model.add_nodes(cube_nodes(0, [offset; 3], 10.0)).unwrap();
            model.add_nodes(cube_nodes(100, [offset; 3], 5.0)).unwrap();
            model
                .add_node(Node::at(200, [offset + 3.0, offset + 6.0, offset + 7.0]))
                .unwrap();
            model.add_element(0, 0, Hexa8::new(ids(0))).unwrap();
            model
                .add_element(
                    1,
                    0,
                    CohesiveInterface::new((100..108).chain([200]).collect()).unwrap(),
                )
                .unwrap();

            let result =
                apply_embedding(&mut model, &[0], &[1], EmbeddingConfig::default()).unwrap();
            assert_eq!(result.num_embedded_nodes(), 1, "offset {}", offset);

            let embedded = model.element(1).unwrap().embedded_node(200).unwrap();
            assert!((embedded.natural_coordinates - Vector3::new(-0.4, 0.2, 0.4)).norm() < 1e-6);
        }
    }

    #[test]
    fn kinematics_selection() {
        let mut model = Model::blank();
        model.add_subdomain(0).unwrap();
        model.add_nodes(cube_nodes(0, [0.0; 3], 1.0)).unwrap();
        model.add_nodes(cube_nodes(100, [0.25; 3], 0.5)).unwrap();
        model.add_node(Node::at(200, [0.3, 0.6, 0.2])).unwrap();
        model.add_element(0, 0, Hexa8::new(ids(0))).unwrap();
        model
            .add_element(
                1,
                0,
                CohesiveInterface::new((100..108).chain([200]).collect())
                    .unwrap()
                    .with_rotations(),
            )
            .unwrap();

        let translations = EmbeddedCohesiveGrouping::new(
            &model,
            &[0],
            &[1],
            EmbeddingConfig::with_rotations(false),
        )
        .unwrap()
        .into_result();
        assert!(translations
            .updates()
            .flat_map(|u| u.embedded_nodes.iter())
            .all(|en| !en.transformation.has_rotations()));

        let rotations = EmbeddedCohesiveGrouping::new(
            &model,
            &[0],
            &[1],
            EmbeddingConfig::with_rotations(true),
        )
        .unwrap()
        .into_result();
        assert_eq!(rotations.kinematics, EmbeddingKinematics::TranslationAndRotation);

        let embedded = &rotations.update_for(1).unwrap().embedded_nodes[0];
        assert!(embedded.transformation.has_rotations());
        assert_eq!(embedded.transformation.coefficients.shape(), (6, 24));

        rotations.apply(&mut model).unwrap();
        let embedder = model.element_embedder(1).unwrap();
        // 8 structural Nodes with 6 DoFs each + 8 host Nodes with 3 DoFs each
        assert_eq!(embedder.superelement_dofs().len(), 48 + 24);
    }

    #[test]
    fn parallel_matches_serial() {
        let mut model = Model::blank();
        model.add_subdomain(0).unwrap();

        // a 3 x 1 x 1 row of hosts
        for h in 0..3 {
            model
                .add_nodes(cube_nodes(10 * h, [h as f64, 0.0, 0.0], 1.0))
                .unwrap();
            model.add_element(h, 0, Hexa8::new(ids(10 * h))).unwrap();
        }

        // interfaces whose extra Nodes lie along the row (the last one outside)
        model.add_nodes(cube_nodes(100, [0.25; 3], 0.5)).unwrap();
        for (i, x) in [0.3, 1.5, 2.0, 2.9, 3.5].iter().enumerate() {
            model.add_node(Node::at(200 + i, [*x, 0.4, 0.6])).unwrap();
        }
        model
            .add_element(
                10,
                0,
                CohesiveInterface::new((100..108).chain(200..203).collect()).unwrap(),
            )
            .unwrap();
        model
            .add_element(
                11,
                0,
                CohesiveInterface::new((100..108).chain(202..205).collect()).unwrap(),
            )
            .unwrap();

        let config = EmbeddingConfig::default();
        let serial = EmbeddedCohesiveGrouping::new(&model, &[0, 1, 2], &[10, 11], config)
            .unwrap()
            .into_result();
        let parallel =
            EmbeddedCohesiveGrouping::new_parallel(&model, &[0, 1, 2], &[10, 11], config)
                .unwrap()
                .into_result();

        assert_eq!(embedded_pairs(&serial), embedded_pairs(&parallel));
        assert_eq!(serial.skipped_duplicates, parallel.skipped_duplicates);
        assert_eq!(
            embedded_pairs(&serial),
            vec![
                (10, 200, 0),
                (10, 201, 1),
                (10, 202, 1),
                (11, 202, 1),
                (11, 203, 2),
            ]
        );
        // Node 202 lies on the face shared by hosts 1 and 2 (twice, once per interface)
        assert_eq!(serial.skipped_duplicates, 2);
    }

    #[cfg(feature = "json_export")]
    #[test]
    fn json_export() {
        let model = single_host_model([0.5, 0.5, 0.5]);
        let result = EmbeddedCohesiveGrouping::new(&model, &[0], &[1], EmbeddingConfig::default())
            .unwrap()
            .into_result();

        let path = std::env::temp_dir().join("fem_embedding_result.json");
        let path = path.to_str().unwrap().to_string();
        result.export_to_json(&path).unwrap();

        let exported = json::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(exported["kinematics"].as_str(), Some("translation-only"));

        let update = &exported["updates"][0];
        assert_eq!(update["element_id"].as_usize(), Some(1));
        assert_eq!(update["embedded_nodes"][0]["node_id"].as_usize(), Some(200));
        assert_eq!(
            update["embedded_nodes"][0]["host_element_id"].as_usize(),
            Some(0)
        );
        assert_eq!(update["embedded_nodes"][0]["host_dofs"].len(), 24);
        assert_eq!(update["embedded_nodes"][0]["coefficients"].len(), 3);
    }
}
