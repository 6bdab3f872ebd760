/*
 * processor_tests.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 *
 * End-to-end rendering tests against the fixture graph in test-fixtures/.
 */

use oaipmh_graph::{CachePolicy, Dataset, GraphCache, MemorySource, Statement, Term};
use oaipmh_template::error::{PathError, ValueError};
use oaipmh_template::vocabulary::FetchError;
use oaipmh_template::{
    FormatDescriptor, MetadataFormat, NullFetcher, RecordContext, Template, TemplateError,
    TemplateProcessor, VocabularyFetcher, VocabularyMapper,
};
use oaipmh_xml::{WriteOptions, XmlElement, to_xml_string};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const ACDH: &str = "https://vocabs.acdh.oeaw.ac.at/schema#";
const ID: &str = "https://id.acdh.oeaw.ac.at/";
const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> std::path::PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

fn fixture_data() -> Dataset {
    oaipmh_graph::rdf::load_file(&fixture_path("data.ttl"))
        .unwrap_or_else(|e| panic!("Failed to load fixture data: {}", e))
}

fn fixture_graph() -> GraphCache {
    GraphCache::new(
        Arc::new(MemorySource::new(fixture_data())),
        CachePolicy::default(),
    )
}

fn format() -> FormatDescriptor {
    let mut format = FormatDescriptor::new("cmdi")
        .with_prefix("acdh", ACDH)
        .with_prefix("skos", SKOS);
    format.value_maps.insert(
        "languages".to_string(),
        BTreeMap::from([
            ("de".to_string(), "deu".to_string()),
            ("en".to_string(), "eng".to_string()),
        ]),
    );
    format
}

fn record(local: &str) -> RecordContext {
    RecordContext::new(format!("{}{}", ID, local))
        .with_oai_id(format!("oai:acdh:{}", local))
        .with_base_url("https://oai.example.org/")
}

fn compact(element: &XmlElement) -> String {
    to_xml_string(element, &WriteOptions::compact()).unwrap()
}

/// Render `source` for the fixture resource with the default format.
fn render(source: &str) -> String {
    render_with(source, &format(), "resource")
}

fn render_with(source: &str, format: &FormatDescriptor, subject: &str) -> String {
    let graph = fixture_graph();
    let vocabulary = VocabularyMapper::new(Arc::new(NullFetcher));
    let template = Template::compile(source).unwrap();
    let mut processor = TemplateProcessor::new(&template, format, &graph, &vocabulary);
    let xml = processor
        .process(&record(subject))
        .unwrap_or_else(|e| panic!("Render failed: {}", e));
    compact(&xml)
}

fn render_error(source: &str) -> TemplateError {
    let graph = fixture_graph();
    let vocabulary = VocabularyMapper::new(Arc::new(NullFetcher));
    let format = format();
    let template = Template::compile(source).unwrap();
    let mut processor = TemplateProcessor::new(&template, &format, &graph, &vocabulary);
    match processor.process(&record("resource")) {
        Ok(xml) => panic!("Expected an error, rendered {}", compact(&xml)),
        Err(e) => e,
    }
}

#[test]
fn test_template_without_control_attributes_is_unchanged() {
    let source = r#"<r xmlns:x="urn:x"><a x:id="1">text</a><b/><![CDATA[raw <data>]]></r>"#;
    assert_eq!(render(source), source);
}

#[test]
fn test_foreach_clones_per_node() {
    let output = render(
        r#"<r><c foreach="/acdh:hasContributor"><n val="/acdh:hasLastName"/></c></r>"#,
    );
    assert_eq!(
        output,
        "<r><c><n>Adler</n></c><c><n>Berger</n></c></r>"
    );
}

#[test]
fn test_foreach_with_remove_splices_each_copy() {
    let output = render(
        r#"<r><g foreach="/acdh:hasContributor" remove="remove"><n val="/acdh:hasFirstName"/></g></r>"#,
    );
    assert_eq!(output, "<r><n>Alice</n><n>Bob</n></r>");
}

#[test]
fn test_conditions_are_evaluated_per_foreach_node() {
    let output = render(
        r#"<r><c foreach="/acdh:hasContributor"><n if="any(acdh:hasFirstName == 'Bob')" val="/acdh:hasLastName"/></c></r>"#,
    );
    assert_eq!(output, "<r><c/><c><n>Berger</n></c></r>");
}

#[test]
fn test_inverse_path_from_collection() {
    let output = render_with(
        r#"<r><m foreach="/^acdh:isPartOf"><t val="/acdh:hasTitle"/></m></r>"#,
        &format(),
        "collection",
    );
    assert_eq!(output, r#"<r><m><t xml:lang="en">Interviews</t></m></r>"#);
}

#[test]
fn test_fanning_slot_drives_copies() {
    let output = render(
        r#"<r><t val="/acdh:hasTitle" val1="/acdh:hasCategory" as1="@type"/></r>"#,
    );
    assert_eq!(
        output,
        concat!(
            r#"<r><t xml:lang="en" type="text">Interview transcript</t>"#,
            r#"<t xml:lang="de" type="text">Interview-Transkript</t></r>"#
        )
    );
}

#[test]
fn test_two_fanning_slots_are_ambiguous() {
    let err = render_error(r#"<r><t val="/acdh:hasTitle" val1="/acdh:hasContributor"/></r>"#);
    assert_eq!(err.location(), Some("/r/t"));
    assert!(matches!(
        err.root(),
        TemplateError::Value(ValueError::AmbiguousFanOut { element, .. }) if element == "t"
    ));
}

#[test]
fn test_required_value_missing_keeps_static_content() {
    let output = render(
        r#"<r><s val="/acdh:hasMissing" required="required">static<i val="/acdh:hasCategory"/></s></r>"#,
    );
    assert_eq!(output, "<r><s>static<i>text</i></s></r>");
}

#[test]
fn test_required_value_missing_with_remove_drops_element() {
    let output = render(
        r#"<r><s val="/acdh:hasMissing" required="required" remove="remove">static</s><k/></r>"#,
    );
    assert_eq!(output, "<r><k/></r>");
}

#[test]
fn test_foreach_with_remove_drops_invalid_copies() {
    let output = render(
        r#"<r><e foreach="/acdh:hasContributor" remove="remove" val="/acdh:hasMissing" required="required">static</e><k/></r>"#,
    );
    assert_eq!(output, "<r><k/></r>");

    // only the copy for Bob has a matching value
    let output = render(
        r#"<r><e foreach="/acdh:hasContributor" remove="remove" val="/acdh:hasFirstName" match="^B" required="required">static</e></r>"#,
    );
    assert_eq!(output, "<r>Bob</r>");
}

#[test]
fn test_slot_attributes_without_value_are_stripped() {
    let output = render(r#"<r><e required="required" format="U:">x</e></r>"#);
    assert_eq!(output, "<r><e>x</e></r>");

    let output = render(
        r#"<r><e val="/acdh:hasCategory" format1="U:" lang2="en" id="k"/></r>"#,
    );
    assert_eq!(output, r#"<r><e id="k">text</e></r>"#);
}

#[test]
fn test_optional_empty_value_removes_element() {
    let output = render(r#"<r><s val="/acdh:hasMissing">placeholder</s><k/></r>"#);
    assert_eq!(output, "<r><k/></r>");
}

#[test]
fn test_if_with_remove_splices_children() {
    let template = r#"<r><g if="any(acdh:hasCategory == '{}')" remove="remove"><a/><b/></g></r>"#;
    assert_eq!(render(&template.replace("{}", "text")), "<r><a/><b/></r>");
    assert_eq!(render(&template.replace("{}", "audio")), "<r/>");
}

#[test]
fn test_insert_modes() {
    let output = render(concat!(
        "<r>",
        r#"<d val="/acdh:hasCategory">placeholder</d>"#,
        r#"<d action="append" val="/acdh:hasCategory">kind: </d>"#,
        r#"<a href="x" val="/acdh:hasCategory" as="@type"/>"#,
        r#"<x val="=&lt;b&gt;bold&lt;/b&gt; text" as="xml"/>"#,
        r#"<x val="=&lt;b&gt;oops" as="xml"/>"#,
        "</r>"
    ));
    assert_eq!(
        output,
        concat!(
            "<r>",
            "<d>text</d>",
            "<d>kind: text</d>",
            r#"<a href="x" type="text"/>"#,
            "<x><b>bold</b> text</x>",
            "<x>&lt;b&gt;oops</x>",
            "</r>"
        )
    );
}

#[test]
fn test_inserted_xml_is_not_interpreted() {
    let output = render(
        r#"<r><x val="=&lt;y val=&quot;/acdh:hasCategory&quot;/&gt;" as="xml"/></r>"#,
    );
    assert_eq!(output, r#"<r><x><y val="/acdh:hasCategory"/></x></r>"#);
}

#[test]
fn test_lang_policies() {
    let output = render(concat!(
        "<r>",
        r#"<t val="/acdh:hasTitle" aggregate="max,en"/>"#,
        r#"<t val="/acdh:hasTitle" aggregate="max,en" lang="skip"/>"#,
        r#"<t xml:lang="fr" val="/acdh:hasTitle" aggregate="max,en"/>"#,
        r#"<t xml:lang="fr" val="/acdh:hasTitle" aggregate="max,en" lang="overwrite"/>"#,
        r#"<t xml:lang="fr" val="/acdh:hasCategory" lang="overwrite"/>"#,
        "</r>"
    ));
    assert_eq!(
        output,
        concat!(
            "<r>",
            r#"<t xml:lang="en">Interview transcript</t>"#,
            "<t>Interview transcript</t>",
            r#"<t xml:lang="fr">Interview transcript</t>"#,
            r#"<t xml:lang="en">Interview transcript</t>"#,
            "<t>text</t>",
            "</r>"
        )
    );
}

#[test]
fn test_custom_lang_attribute() {
    let mut format = format();
    format.lang_attribute = "lang".to_string();
    let output = render_with(
        r#"<r><t val="/acdh:hasTitle" aggregate="min,de"/></r>"#,
        &format,
        "resource",
    );
    assert_eq!(output, r#"<r><t lang="de">Interview-Transkript</t></r>"#);
}

#[test]
fn test_aggregate_falls_back_to_all_languages() {
    // no French title: the minimum over every language wins
    let output = render(r#"<r><t val="/acdh:hasTitle" aggregate="min,fr"/></r>"#);
    assert_eq!(output, r#"<r><t xml:lang="en">Interview transcript</t></r>"#);

    let output = render(r#"<r><t val="/acdh:hasTitle" aggregate="max"/></r>"#);
    assert_eq!(output, r#"<r><t xml:lang="de">Interview-Transkript</t></r>"#);
}

#[test]
fn test_recursive_path_reaches_top_collection() {
    let output = render(
        r#"<r><c val="/acdh:isPartOf*/acdh:hasTitle" aggregate="min,en"/></r>"#,
    );
    assert_eq!(output, r#"<r><c xml:lang="en">Austrian Dialects</c></r>"#);
}

#[test]
fn test_value_pipeline() {
    let output = render(concat!(
        "<r>",
        r#"<date val="/acdh:hasAvailableDate" format="D:%d.%m.%Y"/>"#,
        r#"<size val="/acdh:hasBinarySize" format="d:08"/>"#,
        r#"<lang val="/acdh:hasLanguage" map="languages"/>"#,
        r#"<id val="/acdh:hasIdentifier" match="^https://hdl.handle.net/(.*)$" replace="hdl:$1"/>"#,
        r#"<name val="/acdh:hasTitle" notMatch="-"/>"#,
        r#"<url val="URL" format="U:"/>"#,
        "</r>"
    ));
    assert_eq!(
        output,
        concat!(
            "<r>",
            "<date>04.03.2021</date>",
            "<size>00002048</size>",
            "<lang>deu</lang>",
            r#"<name xml:lang="en">Interview transcript</name>"#,
            "<url>https%3A%2F%2Fid.acdh.oeaw.ac.at%2Fresource</url>",
            "</r>"
        )
    );

    let output = render_with(
        r#"<r><id val="/acdh:hasIdentifier" match="^https://hdl.handle.net/(.*)$" replace="hdl:$1"/></r>"#,
        &format(),
        "collection",
    );
    assert_eq!(output, "<r><id>hdl:21.11115/0000-000C-0001</id></r>");
}

#[test]
fn test_specials() {
    let output = render(concat!(
        "<r>",
        r#"<id val="OAIID"/>"#,
        r#"<link val="OAIURL"/>"#,
        r#"<meta val="METAURL"/>"#,
        r#"<node val="NODE"/>"#,
        "</r>"
    ));
    assert_eq!(
        output,
        concat!(
            "<r>",
            "<id>oai:acdh:resource</id>",
            "<link>https://oai.example.org/?verb=GetRecord&amp;metadataPrefix=cmdi&amp;identifier=oai%3Aacdh%3Aresource</link>",
            "<meta>https://id.acdh.oeaw.ac.at/resource/metadata</meta>",
            "<node>https://id.acdh.oeaw.ac.at/resource</node>",
            "</r>"
        )
    );

    let now = render(r#"<r><now val="NOW"/><n val="RANDOM"/></r>"#);
    let parsed = oaipmh_xml::parse(&now).unwrap();
    let timestamp = parsed.get_children("now")[0].text();
    assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok(), "{}", timestamp);
    assert!(parsed.get_children("n")[0].text().parse::<u32>().is_ok());
}

#[test]
fn test_sequence_counts_within_and_across_renders() {
    let graph = fixture_graph();
    let vocabulary = VocabularyMapper::new(Arc::new(NullFetcher));
    let format = format();
    let template = Template::compile(
        r#"<r><i foreach="/acdh:hasContributor"><n val="SEQ"/></i><last val="SEQ"/></r>"#,
    )
    .unwrap();

    let mut processor = TemplateProcessor::new(&template, &format, &graph, &vocabulary);
    let first = processor.process(&record("resource")).unwrap();
    assert_eq!(
        compact(&first),
        "<r><i><n>1</n></i><i><n>2</n></i><last>3</last></r>"
    );
    let second = processor.process(&record("resource")).unwrap();
    assert_eq!(second.get_children("last")[0].text(), "6");

    let mut fresh = TemplateProcessor::new(&template, &format, &graph, &vocabulary);
    let third = fresh.process(&record("resource")).unwrap();
    assert_eq!(third.get_children("last")[0].text(), "3");
}

#[test]
fn test_comments_are_dropped_unless_preserved() {
    let source = "<r><!-- note --><a/></r>";
    assert_eq!(render(source), "<r><a/></r>");

    let mut format = format();
    format.preserve_comments = true;
    assert_eq!(render_with(source, &format, "resource"), source);
}

#[test]
fn test_render_error_carries_location() {
    let source = r#"<cmd:CMD><cmd:Components><cmd:Bad val="/acdh:hasTitle" format="D:"/></cmd:Components></cmd:CMD>"#;
    let err = render_error(source);
    assert_eq!(err.location(), Some("/cmd:CMD/cmd:Components/cmd:Bad"));
    assert!(matches!(
        err.root(),
        TemplateError::Value(ValueError::InvalidFormat { .. })
    ));
}

#[test]
fn test_render_error_as_xml_document() {
    let graph = fixture_graph();
    let vocabulary = VocabularyMapper::new(Arc::new(NullFetcher));
    let mut format = format();
    format.xml_errors = true;
    let template = Template::compile(
        r#"<cmd:CMD><cmd:Components><cmd:Bad val="/dc:title"/></cmd:Components></cmd:CMD>"#,
    )
    .unwrap();

    let mut processor = TemplateProcessor::new(&template, &format, &graph, &vocabulary);
    let doc = processor.get_xml(&record("resource")).unwrap();
    assert_eq!(doc.name, "error");
    assert_eq!(
        doc.get_children("message")[0].text(),
        "Value error: Unknown namespace prefix 'dc' in 'dc:title'"
    );
    assert_eq!(
        doc.get_children("location")[0].text(),
        "/cmd:CMD/cmd:Components/cmd:Bad"
    );
}

#[test]
fn test_error_document_snapshot() {
    let err = render_error(r#"<r><a remove="yes"/></r>"#);
    let doc = oaipmh_template::processor::error_document(&err);
    let mut doc_without_quotes = doc.clone();
    // attribute names are quoted in the message; keep the snapshot readable
    for message in doc_without_quotes.elements_mut() {
        if message.name == "message" {
            let text = message.text().replace('\'', "");
            message.set_text(text);
        }
    }
    let written = to_xml_string(
        &doc_without_quotes,
        &WriteOptions {
            indent: Some(2),
            declaration: false,
        },
    )
    .unwrap();
    insta::assert_snapshot!(written, @r"
    <error>
      <message>Invalid value yes for attribute remove</message>
      <trace/>
      <location>/r/a</location>
    </error>
    ");
}

#[test]
fn test_structural_errors() {
    assert!(matches!(
        render_error(r#"<r><a val="/hasTitle"/></r>"#).root(),
        TemplateError::Value(ValueError::Path(PathError::InvalidPredicate { .. }))
    ));
    assert!(matches!(
        render_error(r#"<r><a val="/acdh:hasTitle" replace="x"/></r>"#).root(),
        TemplateError::Value(ValueError::MissingDependency { .. })
    ));
    assert!(matches!(
        render_error(r#"<r><a val="/acdh:hasTitle" map="unknown"/></r>"#).root(),
        TemplateError::Value(ValueError::UnknownValueMap { .. })
    ));
    assert!(matches!(
        render_error(r#"<r><a if="any(acdh:hasTitle"/></r>"#).root(),
        TemplateError::Condition { .. }
    ));
    assert!(matches!(
        render_error(r#"<r if="any(acdh:hasCategory == 'audio')"/>"#),
        TemplateError::RootCount { count: 0 }
    ));
}

struct CountingFetcher {
    calls: AtomicUsize,
}

impl VocabularyFetcher for CountingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<Statement>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let label = format!("{}prefLabel", SKOS);
        Ok(vec![
            Statement::new(Term::iri(url), label.as_str(), Term::lang_literal("Attribution", "en")),
            Statement::new(Term::iri(url), label.as_str(), Term::lang_literal("Namensnennung", "de")),
        ])
    }
}

#[test]
fn test_remote_vocabulary_is_fetched_once() {
    let license = "https://vocabs.acdh.oeaw.ac.at/archelicenses/cc-by-4-0";
    let has_license = format!("{}hasLicense", ACDH);
    let data: Dataset = ["a", "b"]
        .iter()
        .map(|local| {
            Statement::new(
                Term::iri(format!("{}{}", ID, local)),
                has_license.as_str(),
                Term::iri(license),
            )
        })
        .collect();
    let graph = GraphCache::new(Arc::new(MemorySource::new(data)), CachePolicy::default());
    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
    });
    let vocabulary = VocabularyMapper::new(fetcher.clone());
    let format = format();
    let template =
        Template::compile(r#"<r><l val="/acdh:hasLicense" map="/skos:prefLabel"/></r>"#).unwrap();

    let mut processor = TemplateProcessor::new(&template, &format, &graph, &vocabulary);
    for local in ["a", "b"] {
        let xml = processor.process(&record(local)).unwrap();
        assert_eq!(
            compact(&xml),
            r#"<r><l xml:lang="en">Attribution</l><l xml:lang="de">Namensnennung</l></r>"#
        );
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(vocabulary.cached_documents(), 1);
}

#[test]
fn test_components_are_loaded_from_files() {
    let template = Template::from_file(
        &fixture_path("cmdi.xml"),
        Some(&fixture_path("components")),
    )
    .unwrap();
    let resource = template
        .root()
        .find_descendant("cmd:Resource")
        .expect("component spliced in");
    assert_eq!(resource.get_attribute("ComponentRef"), Some("c_1"));
    assert!(!resource.has_attribute("ComponentId"));
    assert_eq!(template.path(), Some(fixture_path("cmdi.xml").as_path()));
}

#[test]
fn test_full_format_render() {
    let yaml = std::fs::read_to_string(fixture_path("formats.yaml")).unwrap();
    let mut descriptor: FormatDescriptor = serde_yaml::from_str(&yaml).unwrap();
    descriptor.metadata_prefix = "cmdi".to_string();
    let format = MetadataFormat::load(descriptor, &fixture_path("")).unwrap();

    let graph = GraphCache::new(
        Arc::new(MemorySource::new(fixture_data())),
        CachePolicy::bounded(1),
    );
    let vocabulary = VocabularyMapper::new(Arc::new(NullFetcher));
    let xml = format
        .render(&record("resource"), &graph, &vocabulary)
        .unwrap();

    assert_eq!(
        compact(&xml),
        concat!(
            r#"<cmd:CMD xmlns:cmd="http://www.clarin.eu/cmd/1" CMDVersion="1.2">"#,
            "<cmd:Header><cmd:MdSelfLink>https://oai.example.org/?verb=GetRecord&amp;metadataPrefix=cmdi&amp;identifier=oai%3Aacdh%3Aresource</cmd:MdSelfLink></cmd:Header>",
            "<cmd:Components>",
            r#"<cmd:Resource ComponentRef="c_1">"#,
            r#"<cmd:Title xml:lang="en">Interview transcript</cmd:Title>"#,
            r#"<cmd:Collection xml:lang="en">Austrian Dialects</cmd:Collection>"#,
            "<cmd:Date>2021-03-04</cmd:Date>",
            "<cmd:Language>deu</cmd:Language>",
            "<cmd:Size>00002048</cmd:Size>",
            "<cmd:Contributor><cmd:Name>Adler</cmd:Name><cmd:FirstName>Alice</cmd:FirstName><cmd:Position>1</cmd:Position></cmd:Contributor>",
            "<cmd:Contributor><cmd:Name>Berger</cmd:Name><cmd:FirstName>Bob</cmd:FirstName><cmd:Position>2</cmd:Position></cmd:Contributor>",
            r#"<cmd:Link href="https://id.acdh.oeaw.ac.at/resource"/>"#,
            "</cmd:Resource>",
            "</cmd:Components>",
            "</cmd:CMD>"
        )
    );
    // the bounded cache is emptied once the record is done
    assert!(graph.is_empty());
}
