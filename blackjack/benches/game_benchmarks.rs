use blackjack::{
    Deck,
    entities::{Card, Suit},
    functional::hand_total,
    game::Round,
    messages::{ClientDecision, Decision, Message, Offer, RoundResult, ServerPayload},
    utils::{read_message, write_message},
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;

/// Player 10+9, dealer 10+6 draws a 6: the longest fixed stand round.
fn scripted_deck() -> Deck {
    Deck::from_draw_order([
        Card(10, Suit::Spade),
        Card(9, Suit::Club),
        Card(10, Suit::Diamond),
        Card(6, Suit::Heart),
        Card(6, Suit::Spade),
    ])
}

/// Benchmark shuffling a fresh 52-card deck
fn bench_shuffle(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    c.bench_function("deck_shuffle", |b| {
        b.iter(|| Deck::shuffled_with(&mut rng));
    });
}

/// Benchmark hand totals with growing hand sizes
fn bench_hand_total(c: &mut Criterion) {
    let mut group = c.benchmark_group("hand_total");

    for n_cards in [2usize, 4, 8, 12] {
        let cards: Vec<Card> = Deck::default().undealt()[..n_cards].to_vec();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_cards}_cards")),
            &cards,
            |b, cards| b.iter(|| hand_total(black_box(cards))),
        );
    }

    group.finish();
}

/// Benchmark encoding and decoding the fixed-layout messages
fn bench_codec(c: &mut Criterion) {
    let offer = Offer {
        tcp_port: 40_000,
        server_name: "CyberCasino_7".to_string(),
    };
    let payload = ServerPayload::reveal(RoundResult::InProgress, Card(12, Suit::Heart));
    let offer_bytes = offer.encode();
    let payload_bytes = payload.encode();

    let mut group = c.benchmark_group("codec");
    group.bench_function("offer_encode", |b| b.iter(|| black_box(&offer).encode()));
    group.bench_function("offer_decode", |b| {
        b.iter(|| Offer::decode(black_box(&offer_bytes)))
    });
    group.bench_function("payload_encode", |b| b.iter(|| black_box(&payload).encode()));
    group.bench_function("payload_decode", |b| {
        b.iter(|| ServerPayload::decode(black_box(&payload_bytes)))
    });
    group.finish();
}

/// Benchmark a whole scripted round over an in-memory pipe
fn bench_scripted_round(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    c.bench_function("scripted_round", |b| {
        b.to_async(&runtime).iter(|| async {
            let (mut client, mut server) = tokio::io::duplex(256);
            let dealer = tokio::spawn(async move {
                Round::new(scripted_deck()).play(&mut server, None).await
            });

            for _ in 0..3 {
                let _: ServerPayload = read_message(&mut client, None).await.unwrap();
            }
            write_message(&mut client, &ClientDecision::new(Decision::Stand))
                .await
                .unwrap();
            loop {
                let payload: ServerPayload = read_message(&mut client, None).await.unwrap();
                if payload.result.is_final() {
                    break;
                }
            }
            dealer.await.unwrap().unwrap()
        });
    });
}

criterion_group!(rules, bench_shuffle, bench_hand_total);
criterion_group!(protocol, bench_codec, bench_scripted_round);
criterion_main!(rules, protocol);
