mod common;
use bc::mach::Runtime;
use common::*;

#[test]
fn test_division_uses_scale() {
    let mut r = Runtime::default();
    r.enter("scale=3; 7/2");
    assert_eq!(exec(&mut r), "3.500\n");
    r.enter("scale=0; 7/2");
    assert_eq!(exec(&mut r), "3\n");
}

#[test]
fn test_modulo() {
    let mut r = Runtime::default();
    r.enter("10%3");
    r.enter("-7%3");
    assert_eq!(exec(&mut r), "1\n-1\n");
    r.enter("scale=2; 10%3");
    assert_eq!(exec(&mut r), ".01\n");
}

#[test]
fn test_power() {
    let mut r = Runtime::default();
    r.enter("2^10");
    r.enter("2^100");
    r.enter("1.5^2");
    r.enter("2^-2");
    assert_eq!(
        exec(&mut r),
        "1024\n1267650600228229401496703205376\n2.2\n0\n"
    );
    r.enter("scale=4; 2^-2");
    assert_eq!(exec(&mut r), ".2500\n");
}

#[test]
fn test_power_with_large_exponent() {
    let mut r = Runtime::default();
    let start = std::time::Instant::now();
    r.enter("scale=10; 1.0001 ^ 100000");
    assert_eq!(exec(&mut r), "22015.4560485521\n");
    r.enter("scale=5; .5 ^ 20");
    assert_eq!(exec(&mut r), "0\n");
    r.enter("scale=20; .5 ^ 20");
    assert_eq!(exec(&mut r), ".00000095367431640625\n");
    assert!(start.elapsed() < std::time::Duration::from_secs(10));
}

#[test]
fn test_hex_digits_at_any_input_base() {
    let mut r = Runtime::default();
    r.enter("A; F; 1F");
    assert_eq!(exec(&mut r), "10\n15\n25\n");
    r.enter("ibase=16; A; ibase=A; A; 10");
    assert_eq!(exec(&mut r), "10\n10\n10\n");
    r.enter("ibase=2; A; 11");
    assert_eq!(exec(&mut r), "10\n3\n");
}

#[test]
fn test_power_is_right_associative() {
    let mut r = Runtime::default();
    r.enter("2^3^2");
    r.enter("-2^2");
    assert_eq!(exec(&mut r), "512\n4\n");
}

#[test]
fn test_sqrt() {
    let mut r = Runtime::default();
    r.enter("scale=5; sqrt(2)");
    assert_eq!(exec(&mut r), "1.41421\n");
    r.enter("scale=0; sqrt(16)");
    assert_eq!(exec(&mut r), "4\n");
}

#[test]
fn test_multiply_keeps_operand_scale() {
    let mut r = Runtime::default();
    r.enter("1.25*1.5");
    assert_eq!(exec(&mut r), "1.87\n");
    r.enter("scale=5; 1.25*1.5");
    assert_eq!(exec(&mut r), "1.875\n");
}

#[test]
fn test_input_and_output_bases() {
    let mut r = Runtime::default();
    r.enter("obase=16; 255; -255");
    assert_eq!(exec(&mut r), "FF\n-FF\n");
    r.enter("obase=2; 10");
    assert_eq!(exec(&mut r), "1010\n");
    r.enter("obase=10; ibase=16; FF");
    assert_eq!(exec(&mut r), "255\n");
    r.enter("ibase=2; 1010");
    assert_eq!(exec(&mut r), "10\n");
}

#[test]
fn test_large_output_base() {
    let mut r = Runtime::default();
    r.enter("obase=100; 12345");
    assert_eq!(exec(&mut r), " 01 23 45\n");
}

#[test]
fn test_length_and_scale() {
    let mut r = Runtime::default();
    r.enter("length(123.45); scale(123.45); length(7)");
    assert_eq!(exec(&mut r), "5\n2\n1\n");
}

#[test]
fn test_relations_and_booleans() {
    let mut r = Runtime::default();
    r.enter("1<2; 2<1; 1==1.0; 3!=3; 2>=2; 2<=1");
    assert_eq!(exec(&mut r), "1\n0\n1\n0\n1\n0\n");
    r.enter("!0; 0&&1; 0||2; !(1&&1)");
    assert_eq!(exec(&mut r), "1\n0\n1\n0\n");
}

#[test]
fn test_zero_and_fractions_print_like_bc() {
    let mut r = Runtime::default();
    r.enter("0; .5; -.5; 1.0");
    assert_eq!(exec(&mut r), "0\n.5\n-.5\n1.0\n");
}
