use objinv::codec::{compress, decompress, split_header};
use objinv::intersphinx::{find_matching_object, infer_mapping, IntersphinxError};
use objinv::inventory::{Inventory, InventoryError, Source};
use objinv::schema::SchemaError;
use objinv::{fileops, InventoryRecord};
use serde_json::json;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

const ATTRS: &str = "# Sphinx inventory version 2\n\
# Project: attrs\n\
# Version: 22.1\n\
# The remainder of this file is compressed using zlib.\n\
attr py:module 0 index.html#module-$ -\n\
attr.Attribute py:class 1 api.html#$ -\n\
attr.Factory py:class 1 api.html#$ -\n\
attr.s py:function 1 api.html#$ -\n\
attr.ib py:function 1 api.html#$ -\n\
attr.evolve py:function 1 api.html#$ -\n\
api std:doc -1 api.html API Reference\n\
changelog std:doc -1 changelog.html Changelog\n\
examples std:label -1 examples.html#$ Examples\n";

fn web_inventory(project: &str, records: &[(&str, &str, &str, &str)]) -> Inventory {
    let mut inv = Inventory::new(project, "1.0");
    for (name, domain, role, uri) in records {
        inv.objects.push(InventoryRecord::new(*name, *domain, *role, "1", *uri, "-"));
    }
    inv
}

#[test]
fn test_zlib_file_roundtrip_on_disk() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    let inv = Inventory::from_plaintext(ATTRS.as_bytes()).unwrap();
    fileops::write_bytes(&path, &inv.zlib_file().unwrap()).unwrap();

    let back = Inventory::load(Some(Source::Path(path))).unwrap();
    assert_eq!(back.project, "attrs");
    assert_eq!(back.version, "22.1");
    assert_eq!(back.count(), 9);
    assert_eq!(back.objects, inv.objects);
    assert_eq!(back.data_file(false, true).unwrap(), ATTRS.as_bytes());
}

#[test]
fn test_plaintext_file_import() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(ATTRS.as_bytes()).unwrap();

    let inv = Inventory::from_path(temp_file.path()).unwrap();
    assert_eq!(inv.count(), 9);
    assert_eq!(inv.objects[3].name, "attr.s");
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    match Inventory::from_path(dir.path().join("thisfilewillneverexist.foo")) {
        Err(InventoryError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_periodically_flushed_body() {
    // Emulate a writer that restarts the compressor every few records.
    let (header, body) = split_header(ATTRS.as_bytes());
    let body = std::str::from_utf8(body).unwrap();
    let mut data = header.to_vec();
    let lines: Vec<&str> = body.split_inclusive('\n').collect();
    for chunk in lines.chunks(3) {
        let piece = chunk.concat();
        let mut plain = header.to_vec();
        plain.extend_from_slice(piece.as_bytes());
        let cmp = compress(&plain).unwrap();
        data.extend_from_slice(split_header(&cmp).1);
    }

    assert_eq!(decompress(&data).unwrap(), ATTRS.as_bytes());
    let inv = Inventory::from_bytes(&data).unwrap();
    assert_eq!(inv.count(), 9);
}

#[test]
fn test_version_one_inventory_rejected() {
    let v1 = ATTRS.replace("version 2", "version 1");
    assert!(matches!(
        Inventory::from_bytes(v1.as_bytes()),
        Err(InventoryError::Parse(objinv::ParseError::UnsupportedVersion(_)))
    ));
}

// ── Structured form ──────────────────────────────────────────────────────────

#[test]
fn test_dict_roundtrip() {
    let inv = Inventory::from_plaintext(ATTRS.as_bytes()).unwrap();
    let d = inv.json_dict();
    let back = Inventory::from_dict(&d).unwrap();
    assert_eq!(back.json_dict(), d);
    assert_eq!(back.data_file(false, true).unwrap(), ATTRS.as_bytes());
}

#[test]
fn test_dict_missing_version() {
    let mut d = Inventory::from_plaintext(ATTRS.as_bytes()).unwrap().json_dict();
    d.as_object_mut().unwrap().remove("version");
    assert!(matches!(
        Inventory::from_dict(&d),
        Err(InventoryError::Schema(SchemaError::Invalid { .. }))
    ));
}

#[test]
fn test_dict_too_few_objects() {
    let d = json!({
        "project": "demo", "version": "1", "count": 3,
        "0": {"name": "a", "domain": "py", "role": "data", "priority": "1", "uri": "a.html#a", "dispname": "a"},
        "1": {"name": "b", "domain": "py", "role": "data", "priority": "1", "uri": "b.html#b", "dispname": "b"}
    });
    assert!(matches!(
        Inventory::from_dict(&d),
        Err(InventoryError::RecordCountMismatch { declared: 3, found: 2 })
    ));
}

#[test]
fn test_dict_too_many_objects() {
    let mut d = Inventory::from_plaintext(ATTRS.as_bytes()).unwrap().json_dict();
    let extra = d["3"].clone();
    d["57"] = extra;
    assert!(matches!(
        Inventory::from_dict(&d),
        Err(InventoryError::RecordCountMismatch { declared: 9, found: 10 })
    ));
}

#[test]
fn test_dict_bad_object_and_root_key() {
    let base = Inventory::from_plaintext(ATTRS.as_bytes()).unwrap().json_dict();

    let mut bad_obj = base.clone();
    bad_obj["112"] = json!("foobarbazquux");
    assert!(matches!(Inventory::from_dict(&bad_obj), Err(InventoryError::Schema(_))));

    let mut bad_root = base;
    bad_root["bad_foo"] = json!("angry_bar");
    assert!(matches!(Inventory::from_dict(&bad_root), Err(InventoryError::Schema(_))));
}

#[test]
fn test_dict_keys_must_be_indices() {
    let d = json!({
        "project": "demo", "version": "1", "count": 2,
        "0": {"name": "a", "domain": "py", "role": "data", "priority": "1", "uri": "a.html#$", "dispname": "-"},
        "5": {"name": "b", "domain": "py", "role": "data", "priority": "1", "uri": "b.html#$", "dispname": "-"}
    });
    assert!(matches!(
        Inventory::from_dict(&d),
        Err(InventoryError::Schema(SchemaError::UnexpectedEntryKey { .. }))
    ));
}

#[test]
fn test_dict_import_expands_abbreviations() {
    let d = json!({
        "project": "demo", "version": "", "count": 1,
        "0": {"name": "demo.f", "domain": "py", "role": "function", "priority": "1", "uri": "api.html#$", "dispname": "-"}
    });
    let inv = Inventory::from_dict(&d).unwrap();
    assert_eq!(inv.objects[0].uri, "api.html#demo.f");
    assert_eq!(inv.objects[0].dispname, "demo.f");
    assert_eq!(inv.version, "");
}

// ── Intersphinx ──────────────────────────────────────────────────────────────

#[test]
fn test_infer_mapping_flask_default_location() {
    let inv = web_inventory("flask", &[
        ("flask", "py", "module", "api/#module-$"),
        ("flask.Flask", "py", "class", "api/#$"),
        ("flask.Config", "py", "class", "api/#$"),
    ]);
    let mapping = infer_mapping(
        "https://flask.palletsprojects.com/en/1.1.x/api/#flask.Config",
        "https://flask.palletsprojects.com/en/1.1.x/objects.inv",
        &inv,
    ).unwrap();
    assert_eq!(mapping, ("https://flask.palletsprojects.com/en/1.1.x/".to_string(), None));
}

#[test]
fn test_infer_mapping_django_custom_location() {
    let inv = web_inventory("django", &[
        ("django.core.cache", "py", "module", "ref/cache/#module-$"),
        ("cache-arguments", "std", "label", "topics/cache/#$"),
        ("memcached", "std", "label", "topics/cache/#$"),
    ]);
    let mapping = infer_mapping(
        "https://docs.djangoproject.com/en/4.0/topics/cache/#memcached",
        "https://docs.djangoproject.com/en/4.0/_objects/",
        &inv,
    ).unwrap();
    assert_eq!(mapping, (
        "https://docs.djangoproject.com/en/4.0/".to_string(),
        Some("https://docs.djangoproject.com/en/4.0/_objects/".to_string()),
    ));
}

#[test]
fn test_infer_mapping_numpy() {
    let inv = web_inventory("numpy", &[
        ("numpy.ndarray", "py", "class", "reference/generated/numpy.ndarray.html#$"),
        ("python-side", "std", "label", "reference/arrays.interface.html#$"),
    ]);
    let mapping = infer_mapping(
        "https://docs.scipy.org/doc/numpy-1.13.0/reference/arrays.interface.html#python-side",
        "https://docs.scipy.org/doc/numpy-1.13.0/objects.inv",
        &inv,
    ).unwrap();
    assert_eq!(mapping, ("https://docs.scipy.org/doc/numpy-1.13.0/".to_string(), None));
}

#[test]
fn test_no_matching_object() {
    let inv = web_inventory("django", &[
        ("memcached", "std", "label", "topics/cache/#$"),
    ]);
    let err = find_matching_object(
        "https://docs.djangoproject.com/en/4.0/topicXYZs/cache/#memcached",
        &inv,
    ).unwrap_err();
    assert!(matches!(err, IntersphinxError::NoMatchingObject { .. }));
}
