use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use netplay::{
    BitBuffer, BitDeserialize, BitSerialize, CodecConfig, GameData, Packet, PacketCodec,
    PlayerState, ReliableMessage, ReliablePacket, StateHash, UnreliablePacket, UnreliablePlayer,
    Vec2, Vec3, MAX_PLAYERS,
};
use std::hint::black_box;

fn full_player(i: u8) -> UnreliablePlayer {
    UnreliablePlayer {
        position: Some(Vec3::new(-49.85 + i as f32, -41.55, 167.27)),
        rotation: Some(0.0366),
        rings: Some(52),
        air: Some(123_456),
        velocity: Some(Vec2::new(0.7287, 0.1235)),
        state: Some(PlayerState::NormalOnBoard),
    }
}

fn game_data() -> GameData {
    let mut data = GameData::with_original_gears();
    for (i, gear) in data.gears.iter_mut().enumerate() {
        gear.weight = i as f32;
        gear.who_can_select = i as u16;
    }
    data
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    let player = full_player(0);

    group.throughput(Throughput::Elements(1));

    group.bench_function("serialize", |b| {
        b.iter(|| {
            let mut buf = BitBuffer::with_capacity(32);
            black_box(&player).bit_serialize(&mut buf).unwrap();
            black_box(buf.into_bytes());
        });
    });

    let mut buf = BitBuffer::with_capacity(32);
    player.bit_serialize(&mut buf).unwrap();
    let bytes = buf.into_bytes();

    group.bench_function("deserialize", |b| {
        b.iter(|| {
            let mut buf = BitBuffer::from_slice(black_box(&bytes));
            black_box(UnreliablePlayer::bit_deserialize(&mut buf).unwrap());
        });
    });

    group.finish();
}

fn bench_packet_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet");

    let packet = UnreliablePacket::new(42, (0..MAX_PLAYERS as u8).map(full_player));
    let encoded = packet.encode().unwrap();
    let codec = PacketCodec::new(CodecConfig::default()).unwrap();

    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| {
            black_box(black_box(&packet).encode().unwrap());
        });
    });

    group.bench_function("encode_pooled", |b| {
        b.iter(|| {
            black_box(codec.encode(black_box(&packet)).unwrap());
        });
    });

    group.bench_function("decode", |b| {
        b.iter(|| {
            black_box(UnreliablePacket::decode(black_box(&encoded)).unwrap());
        });
    });

    group.bench_function("decode_pooled", |b| {
        b.iter(|| {
            black_box(codec.decode(black_box(&encoded)).unwrap());
        });
    });

    group.finish();
}

fn bench_game_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("game_data");

    let data = game_data();
    let packet = ReliablePacket::new(1, ReliableMessage::GameData(data.clone()));
    let encoded = packet.encode().unwrap();
    let codec = PacketCodec::new(CodecConfig::default()).unwrap();

    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_function("roundtrip", |b| {
        b.iter(|| {
            let bytes = codec.encode(black_box(&packet)).unwrap();
            black_box(codec.decode_reliable(&bytes).unwrap());
        });
    });

    group.bench_function("hash", |b| {
        b.iter(|| {
            black_box(codec.hash(black_box(&data)).unwrap());
        });
    });

    group.bench_function("hash_bytes", |b| {
        b.iter(|| {
            black_box(StateHash::of(black_box(&encoded)));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_serialization,
    bench_packet_encode_decode,
    bench_game_data,
);
criterion_main!(benches);
