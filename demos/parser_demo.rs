use gcode5d::parser::{parse, tokenize};

fn main() {
    println!("=== Tokenizer ===");

    let test_lines = [
        "G1 X10 Y20.5 Z0.2 ; linear move",
        "M104 S200 ; set temperature",
        "(this is a comment)",
        "; another comment",
        "",
        "G28 X Y ; home X and Y",
        "G1 XTEN Y0",
    ];

    for line in test_lines {
        println!("\nInput: '{}'", line);
        match tokenize(line) {
            Ok(Some(token)) => println!("Token: {:?}", token),
            Ok(None) => println!("(nothing to interpret)"),
            Err(err) => println!("Error: {}", err),
        }
    }

    println!("\n=== Document ===");

    let program = [
        "G21",
        "G90",
        "M83",
        "G1 Z0.2 F1200",
        "G1 X10 Y0 E0.5",
        "G2 X20 Y0 I5 J0 E0.8",
        "M117 Layer 1",
        "G91",
        "G1 X-5 Y5 E0.2",
    ];

    let document = match parse(program) {
        Ok(document) => document,
        Err(err) => {
            eprintln!("parse failed: {}", err);
            return;
        }
    };

    for command in document.iter() {
        let p = command.position();
        println!(
            "{:<4} X{:>8.3} Y{:>8.3} Z{:>6.2} E{:>7.3}{}",
            command.id().to_string(),
            p.x,
            p.y,
            p.z,
            command.extrusion(),
            if command.performs_extrusion() { "  *" } else { "" }
        );
    }

    if let Ok((head, tail)) = document.split_at(5) {
        println!("\n=== Second half after split ===\n{}", tail.serialize());
        if let Ok(merged) = head.merge(&tail) {
            println!("merged back: {} commands", merged.len());
        }
    }
}
