//! End-to-end round trips: assemble source, write it to a real file on
//! disk, read it back, and run it — exercising the three crate
//! boundaries (`asm`, `image`, `cpu`) together the way the two binaries
//! actually use them.

use std::fs::File;
use std::io::{Seek, SeekFrom};

use vm_core::asm::{assemble, AsmOptions};
use vm_core::cpu::{Cpu, VmIo, DEFAULT_MEMORY_SIZE};
use vm_core::image::{read_image, write_image};

struct RecordingIo {
    output: Vec<u8>,
}

impl VmIo for RecordingIo {
    fn read_in(&mut self) -> u8 {
        0
    }
    fn write_out(&mut self, value: u8) {
        self.output.push(value);
    }
}

fn assemble_load_and_run(source: &str) -> Vec<u8> {
    let program = assemble(source, AsmOptions::default()).expect("assembly succeeds");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("program.bin");
    {
        let mut file = File::create(&path).expect("create image file");
        write_image(&mut file, program.origin, &program.bytes).expect("write image");
    }

    let mut file = File::open(&path).expect("open image file");
    file.seek(SeekFrom::Start(0)).unwrap();
    let image = read_image(&mut file).expect("read image");

    let mut cpu = Cpu::new(DEFAULT_MEMORY_SIZE, image.origin, &image.bytes).expect("cpu init");
    let mut io = RecordingIo { output: Vec::new() };
    cpu.run(&mut io).expect("program runs to completion");
    io.output
}

#[test]
fn hello_number_round_trips_through_a_real_file() {
    let output = assemble_load_and_run("ORG $0200\nLDA #42\nOUT\nHALT\n");
    assert_eq!(output, vec![42]);
}

#[test]
fn countdown_round_trips_through_a_real_file() {
    let source = "ORG $0200\nLDX #3\nTXA\nOUT\nDEX\nCPX #0\nJNE $0202\nHALT\n";
    let output = assemble_load_and_run(source);
    assert_eq!(output, vec![3, 2, 1]);
}

#[test]
fn division_by_zero_surfaces_as_a_runtime_error_not_a_panic() {
    let program = assemble("ORG $0200\nLDA #10\nDIV #0\nHALT\n", AsmOptions::default()).unwrap();
    let mut cpu = Cpu::new(DEFAULT_MEMORY_SIZE, program.origin, &program.bytes).unwrap();
    let mut io = RecordingIo { output: Vec::new() };
    let err = cpu.run(&mut io).unwrap_err();
    assert!(err.to_string().contains("division by zero"));
}
