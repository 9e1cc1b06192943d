// example/src/main.rs

include!(concat!(env!("OUT_DIR"), "/shapes.rs"));

use brine_wire::*;

// Bring the generated types into scope:
use shapes::{Drawing, Kind, Path, Point, Shape, MAX_POINTS, UNTITLED};

fn main() -> Result<(), WireError> {
    let mut path = Path::default();
    for i in 0..3 {
        path.point.push(Point::new(i as f64, (i * i) as f64 / 2.0));
    }
    assert!(path.point.len() <= MAX_POINTS as usize);

    let drawing = Drawing::new(
        UNTITLED.to_owned(),
        Some(b"brine".to_vec()),
        Point::new(0.5, -1.0),
        path,
        Shape {
            kind: Kind::CIRCLE,
            radius: 2.5,
            ..Shape::default()
        },
    );

    // Generated code: pack, then unpack into a fresh value.
    let mut bb = ByteBufferMut::with_capacity(drawing.packed_size());
    drawing.pack(&mut bb);
    let bytes = bb.data();
    println!("packed {} bytes", bytes.len());

    let mut decoded = Drawing::default();
    if decoded.unpack(&mut ByteBuffer::new(&bytes)).is_err() {
        eprintln!("could not unpack drawing");
        std::process::exit(1);
    }
    assert_eq!(decoded, drawing);

    // Whole-struct helpers and std::io streams share the same encoding.
    assert_eq!(drawing.to_bytes(), bytes);
    let mut stream = Vec::new();
    drawing.write_to(&mut stream)?;
    let mut streamed = Drawing::default();
    streamed.read_from(&mut stream.as_slice())?;
    assert_eq!(streamed, drawing);

    let indent = Indent::default();
    let mut text = String::new();
    decoded.print(&mut text, &indent, 0);
    println!("{}", text);

    // The dynamic engine reads the same bytes from the schema alone.
    let table = compile_schema(include_str!("../shapes.wire"), "shapes.wire")?;
    let schema = to_runtime_schema(&table);
    if let Some(type_id) = schema.find("Drawing") {
        match Value::decode(&schema, type_id, &bytes) {
            Ok(value) => assert_eq!(value.to_text(&schema, type_id, &indent), text),
            Err(()) => eprintln!("dynamic decode failed"),
        }
    }

    let copy = decoded.dup();
    decoded.clear();
    println!(
        "cleared: {} bytes, copy: {} bytes",
        decoded.packed_size(),
        copy.packed_size()
    );
    copy.destroy();

    Ok(())
}
