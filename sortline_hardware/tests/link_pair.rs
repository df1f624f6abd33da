use sortline_hardware::link::pair;
use sortline_traits::LinkPort;

#[test]
fn bytes_cross_the_link_in_order() {
    let (mut scale_end, mut sort_end) = pair();

    assert!(scale_end.write(b"Khoi_luong:250.000g\n").unwrap());
    assert_eq!(sort_end.available(), 20);

    let mut got = Vec::new();
    while let Some(b) = sort_end.read_byte().unwrap() {
        got.push(b);
    }
    assert_eq!(got, b"Khoi_luong:250.000g\n");
    assert_eq!(sort_end.available(), 0);
}

#[test]
fn link_is_full_duplex() {
    let (mut a, mut b) = pair();
    a.write(b"x").unwrap();
    b.write(b"y").unwrap();
    assert_eq!(b.read_byte().unwrap(), Some(b'x'));
    assert_eq!(a.read_byte().unwrap(), Some(b'y'));
}

#[test]
fn write_to_hung_up_peer_fails() {
    let (mut a, b) = pair();
    drop(b);
    let err = a.write(b"z").expect_err("peer is gone");
    assert!(format!("{err}").contains("disconnected"));
}

#[test]
fn read_after_peer_drop_drains_then_returns_none() {
    let (mut a, mut b) = pair();
    a.write(b"ok").unwrap();
    drop(a);
    assert_eq!(b.read_byte().unwrap(), Some(b'o'));
    assert_eq!(b.read_byte().unwrap(), Some(b'k'));
    assert_eq!(b.read_byte().unwrap(), None);
}
