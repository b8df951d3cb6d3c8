use std::collections::{BTreeMap, HashMap};
use std::error::Error as _;

use header_csv::{
    BoxError, CellError, DecodeError, Decoder, Dynamic, Error, PayloadCell, PayloadCodec, Record,
    TextCell, TextCodec,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Record, PayloadCell)]
struct AString {
    #[csv("A")]
    a: String,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Primitives {
    flag: bool,
    int: i64,
    uint: u16,
    float: f64,
    #[csv("text")]
    label: String,
}

#[derive(Debug, Default, PartialEq, Record)]
struct AInterface {
    #[csv("a")]
    a: Dynamic,
}

#[derive(Debug, Default, PartialEq, Record)]
struct AStruct {
    #[csv("a")]
    a: AString,
}

#[derive(Debug, Default, PartialEq, Record)]
struct AMap {
    #[csv("a")]
    a: HashMap<String, String>,
}

#[derive(Debug, Default, PartialEq, Record)]
struct APtr {
    #[csv("A")]
    a: Option<String>,
    #[csv("B")]
    b: String,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Triple {
    a: i32,
    b: i32,
    c: i32,
}

/// Hexadecimal number with its own cell text.
#[derive(Debug, Default, PartialEq, TextCell)]
struct Hex(i64);

impl TextCodec for Hex {
    fn decode_text(&mut self, text: &str) -> Result<(), BoxError> {
        self.0 = i64::from_str_radix(text, 16)?;
        Ok(())
    }

    fn encode_text(&self) -> Result<String, BoxError> {
        Ok(format!("{:X}", self.0))
    }
}

#[derive(Debug, Default, PartialEq, Record)]
struct MaybeHex {
    h: Option<Hex>,
    x: i32,
}

fn record<T: Record + Default>(input: &str) -> T {
    let mut out = T::default();
    assert!(Decoder::new(input.as_bytes()).decode_record(&mut out).unwrap());
    out
}

fn all<T: Record + Default>(input: &str) -> Vec<T> {
    let mut out = Vec::new();
    Decoder::new(input.as_bytes()).decode_all(&mut out).unwrap();
    out
}

fn decode_error<T: Record + Default>(input: &str) -> DecodeError {
    let mut out = T::default();
    match Decoder::new(input.as_bytes()).decode_record(&mut out) {
        Err(Error::Decode(err)) => err,
        other => panic!("expected decode error for {input:?}, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Records
// ═══════════════════════════════════════════════════════════════

#[test]
fn aggregate_fields() {
    assert_eq!(record::<AString>("A\nb\n"), AString { a: "b".into() });
    assert_eq!(record::<AString>("A,B\nb,c\n"), AString { a: "b".into() });

    let p = record::<Primitives>("text,float,uint,int,flag\nhi,123,7,-5,true\n");
    assert_eq!(
        p,
        Primitives { flag: true, int: -5, uint: 7, float: 123.0, label: "hi".into() }
    );
}

#[test]
fn integer_prefixes() {
    let p = record::<Primitives>("int,uint\n0x123,0123\n");
    assert_eq!(p.int, 0x123);
    assert_eq!(p.uint, 0o123);
}

#[test]
fn open_values_keep_raw_text() {
    assert_eq!(record::<AInterface>("a\nhoge\n").a, Dynamic::Text("hoge".into()));

    let map = record::<BTreeMap<String, Dynamic>>("a,b\nhoge,1\n");
    assert_eq!(map["a"].as_text(), Some("hoge"));
    assert_eq!(map["b"].as_text(), Some("1"));
}

#[test]
fn maps() {
    let strings = record::<HashMap<String, String>>("a\nb\n");
    assert_eq!(strings, HashMap::from([("a".to_string(), "b".to_string())]));

    let ints = record::<HashMap<String, i32>>("a\n123\n");
    assert_eq!(ints["a"], 123);
}

#[test]
fn nested_payload_cells() {
    let input = "a\n\"{\"\"A\"\":\"\"hoge\"\"}\"\n";
    let json = "a\n\"{\"\"a\"\":\"\"hoge\"\"}\"\n";
    assert_eq!(record::<AStruct>(json).a, AString { a: "hoge".into() });
    assert_eq!(
        record::<HashMap<String, AString>>(json)["a"],
        AString { a: "hoge".into() }
    );
    assert_eq!(
        record::<AMap>(input).a,
        HashMap::from([("A".to_string(), "hoge".to_string())])
    );
}

#[test]
fn rows_as_sequences() {
    let rows = all::<Vec<String>>("a,b,c\n1,2,3\n4,5,6\n");
    assert_eq!(rows, [["1", "2", "3"], ["4", "5", "6"]]);

    let fixed = all::<[String; 3]>("a,b,c\n1,2,3\n4,5,6\n");
    assert_eq!(fixed, [["1", "2", "3"], ["4", "5", "6"]]);
}

#[test]
fn text_codec_owns_the_cell() {
    let map = record::<HashMap<String, Hex>>("a\nA\n");
    assert_eq!(map["a"], Hex(10));

    let err = decode_error::<HashMap<String, Hex>>("a\nzz\n");
    assert!(matches!(err.source, CellError::Text(_)));
}

#[test]
fn empty_cell_leaves_optional_text_codec_absent() {
    let row = record::<MaybeHex>("h,x\n,1\n");
    assert_eq!(row, MaybeHex { h: None, x: 1 });

    let row = record::<MaybeHex>("h,x\nff,2\n");
    assert_eq!(row.h, Some(Hex(255)));
}

#[test]
fn optional_fields_and_records() {
    let rows = all::<Option<APtr>>("A,B\na,b\n,b\na,\n");
    assert_eq!(
        rows,
        [
            Some(APtr { a: Some("a".into()), b: "b".into() }),
            Some(APtr { a: None, b: "b".into() }),
            Some(APtr { a: Some("a".into()), b: String::new() }),
        ]
    );

    let boxed = all::<Box<AString>>("A\nhoge\nfuga");
    assert_eq!(boxed.len(), 2);
    assert_eq!(boxed[1].a, "fuga");
}

#[test]
fn short_rows_leave_trailing_fields_untouched() {
    let mut row = Triple { a: 7, b: 8, c: 9 };
    let mut dec = Decoder::new("a,b,c\n1\n".as_bytes());
    assert!(dec.decode_record(&mut row).unwrap());
    assert_eq!(row, Triple { a: 1, b: 8, c: 9 });
}

#[test]
fn extra_cells_are_ignored() {
    let mut dec = Decoder::new("a\n1,2,3\n".as_bytes());
    let mut row = Triple::default();
    assert!(dec.decode_record(&mut row).unwrap());
    assert_eq!(row, Triple { a: 1, b: 0, c: 0 });
}

// ═══════════════════════════════════════════════════════════════
//  Bulk decoding
// ═══════════════════════════════════════════════════════════════

#[test]
fn decode_all_replaces_the_destination() {
    let mut out = vec![AString { a: "stale".into() }];
    Decoder::new("A\nhoge\nfuga".as_bytes()).decode_all(&mut out).unwrap();
    assert_eq!(out, [AString { a: "hoge".into() }, AString { a: "fuga".into() }]);
}

#[test]
fn decode_all_keeps_rows_before_an_error() {
    let mut out: Vec<Triple> = Vec::new();
    let err = Decoder::new("a\n1\n2\nx\n4\n".as_bytes()).decode_all(&mut out).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(out.iter().map(|t| t.a).collect::<Vec<_>>(), [1, 2]);
}

#[test]
fn decode_array_resets_the_first_unfilled_slot() {
    let mut out: [Option<AString>; 3] = Default::default();
    out[2] = Some(AString { a: "stale".into() });
    let n = Decoder::new("A\nhoge\nfuga\n".as_bytes()).decode_array(&mut out).unwrap();
    assert_eq!(n, 2);
    assert_eq!(out[0], Some(AString { a: "hoge".into() }));
    assert_eq!(out[1], Some(AString { a: "fuga".into() }));
    assert_eq!(out[2], None);
}

#[test]
fn records_iterator() {
    let mut dec = Decoder::new("A\nhoge\nfuga\n".as_bytes());
    let names: Vec<String> = dec.records::<AString>().map(|r| r.unwrap().a).collect();
    assert_eq!(names, ["hoge", "fuga"]);
}

// ═══════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════

fn assert_at_first_cell(err: &DecodeError) {
    assert_eq!((err.start_line, err.line, err.column), (2, 2, 1), "{err}");
    assert_eq!(err.field, "a");
    assert!(err.source().is_some());
}

#[test]
fn overflow_is_located() {
    #[derive(Debug, Default, Record)]
    struct Narrow {
        #[csv("a")]
        a: i8,
    }

    let errors = [
        decode_error::<HashMap<String, i8>>("a\n128\n"),
        decode_error::<Vec<i8>>("a\n128\n"),
        decode_error::<[i8; 1]>("a\n128\n"),
        decode_error::<Narrow>("a\n128\n"),
        decode_error::<HashMap<String, u8>>("a\n256\n"),
        decode_error::<HashMap<String, f32>>("a\n1e100\n"),
    ];
    for err in &errors {
        assert_at_first_cell(err);
        assert!(err.is_overflow(), "{err}");
    }
}

#[test]
fn syntax_errors_are_located() {
    let errors = [
        decode_error::<HashMap<String, i8>>("a\nabc\n"),
        decode_error::<HashMap<String, u8>>("a\nabc\n"),
        decode_error::<HashMap<String, f32>>("a\nabc\n"),
        decode_error::<HashMap<String, bool>>("a\nyes\n"),
    ];
    for err in &errors {
        assert_at_first_cell(err);
        assert!(matches!(err.source, CellError::Syntax { .. }), "{err}");
    }
}

#[derive(Debug, Default, Record)]
struct TextThenByte {
    a: String,
    b: u8,
}

#[test]
fn multi_line_record_reports_both_lines() {
    let err = decode_error::<TextThenByte>("a,b\n\"x\ny\",300\n");
    assert!(err.source.is_overflow());
    assert_eq!((err.start_line, err.line, err.column), (2, 3, 4));
    assert_eq!(err.field, "b");
    assert!(err.to_string().contains("starting at line 2"));
}

#[test]
fn malformed_payload_is_located() {
    let err = decode_error::<AStruct>("a\n{oops\n");
    assert_at_first_cell(&err);
    assert!(matches!(err.source, CellError::Payload(_)));
}

#[test]
fn unsupported_map_keys() {
    let mut map: HashMap<i32, Dynamic> = HashMap::new();
    let err = Decoder::new("a\nb\n".as_bytes()).decode_record(&mut map).unwrap_err();
    assert!(matches!(err, Error::UnsupportedShape(_)));
}

// ═══════════════════════════════════════════════════════════════
//  Collaborators
// ═══════════════════════════════════════════════════════════════

/// `key=value;key=value` objects.
struct PairsCodec;

impl PayloadCodec for PairsCodec {
    fn decode(&self, text: &str) -> Result<serde_json::Value, BoxError> {
        let mut map = serde_json::Map::new();
        for pair in text.split(';').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').ok_or("expected key=value")?;
            map.insert(k.to_owned(), v.into());
        }
        Ok(map.into())
    }

    fn encode(&self, _: &serde_json::Value) -> Result<String, BoxError> {
        Err("read only".into())
    }
}

#[test]
fn payload_codec_is_replaceable() {
    let mut row = AMap::default();
    let mut dec = Decoder::new("a\nx=1;y=2\n".as_bytes()).with_payload_codec(PairsCodec);
    assert!(dec.decode_record(&mut row).unwrap());
    assert_eq!(row.a["x"], "1");
    assert_eq!(row.a["y"], "2");
}

#[test]
fn explicit_header_is_used_for_every_row() {
    let mut dec = Decoder::new("b\nc\n".as_bytes());
    dec.set_header(["A"]).unwrap();
    let names: Vec<String> = dec.records::<AString>().map(|r| r.unwrap().a).collect();
    assert_eq!(names, ["b", "c"]);
}
