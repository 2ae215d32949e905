//! End-to-end encode / lose / decode scenarios

use fecrs::fec::{
    decode, decode_parallel, encode, encode_parallel, BlockKind, FecCodec, FecError,
    MAX_DATA_BLOCKS, MAX_FEC_BLOCKS,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_batch(rng: &mut StdRng, k: usize, len: usize) -> Vec<Vec<u8>> {
    (0..k)
        .map(|_| {
            let mut block = vec![0u8; len];
            rng.fill(&mut block[..]);
            block
        })
        .collect()
}

fn encode_batch(data: &[Vec<u8>], m: usize, len: usize) -> Vec<Vec<u8>> {
    let mut fec = vec![vec![0u8; len]; m];
    encode(len, data, &mut fec).unwrap();
    fec
}

fn lose_and_decode(
    original: &[Vec<u8>],
    fec: &[Vec<u8>],
    erased: &[usize],
    fec_indices: &[usize],
) -> Vec<Vec<u8>> {
    let len = original[0].len();
    let mut data = original.to_vec();
    for &e in erased {
        data[e] = vec![0xA5; len];
    }
    let mut received: Vec<Vec<u8>> = fec_indices.iter().map(|&r| fec[r].clone()).collect();
    decode(len, &mut data, erased, &mut received, fec_indices).unwrap();
    data
}

#[test]
fn test_k8_m2_lose_one_use_one_of_two() {
    let mut rng = StdRng::seed_from_u64(1);
    let original = random_batch(&mut rng, 8, 1024);
    let fec = encode_batch(&original, 2, 1024);

    for lost in 0..8 {
        for fec_index in 0..2 {
            let data = lose_and_decode(&original, &fec, &[lost], &[fec_index]);
            assert_eq!(data, original, "lost {lost} with FEC {fec_index}");
        }
    }
}

#[test]
fn test_k9_m3_lose_three_supply_all() {
    let mut rng = StdRng::seed_from_u64(2);
    let original = random_batch(&mut rng, 9, 300);
    let fec = encode_batch(&original, 3, 300);

    for erased in [[0, 1, 2], [6, 7, 8], [8, 0, 4], [2, 5, 7]] {
        let data = lose_and_decode(&original, &fec, &erased, &[0, 1, 2]);
        assert_eq!(data, original, "erased {erased:?}");
        let data = lose_and_decode(&original, &fec, &erased, &[2, 0, 1]);
        assert_eq!(data, original, "erased {erased:?} with shuffled FEC");
    }
}

#[test]
fn test_non_contiguous_fec_indices() {
    let mut rng = StdRng::seed_from_u64(3);
    let original = random_batch(&mut rng, 20, 64);
    let fec = encode_batch(&original, 10, 64);

    let data = lose_and_decode(&original, &fec, &[3, 11, 19], &[9, 2, 5]);
    assert_eq!(data, original);
}

#[test]
fn test_maximum_shape_accepted() {
    let mut rng = StdRng::seed_from_u64(4);
    let original = random_batch(&mut rng, MAX_DATA_BLOCKS, 8);
    let fec = encode_batch(&original, MAX_FEC_BLOCKS, 8);

    let erased: Vec<usize> = (0..MAX_DATA_BLOCKS).collect();
    let fec_indices: Vec<usize> = (0..MAX_FEC_BLOCKS).rev().collect();
    let data = lose_and_decode(&original, &fec, &erased, &fec_indices);
    assert_eq!(data, original);
}

#[test]
fn test_over_limit_rejected() {
    let data = vec![vec![0u8; 4]; MAX_DATA_BLOCKS + 1];
    let mut fec = vec![vec![0u8; 4]; 1];
    assert_eq!(
        encode(4, &data, &mut fec),
        Err(FecError::TooManyDataBlocks { count: 129 })
    );

    let data = vec![vec![0u8; 4]; 1];
    let mut fec = vec![vec![0u8; 4]; MAX_FEC_BLOCKS + 1];
    assert_eq!(
        encode(4, &data, &mut fec),
        Err(FecError::TooManyFecBlocks { count: 129 })
    );

    let mut data = vec![vec![0u8; 4]; 4];
    let mut received = vec![vec![0u8; 4]];
    assert_eq!(
        decode(4, &mut data, &[0], &mut received, &[128]),
        Err(FecError::FecIndexOutOfRange {
            index: 128,
            fec_blocks: 128
        })
    );
}

#[test]
fn test_zero_length_fragments() {
    let original: Vec<Vec<u8>> = vec![Vec::new(); 5];
    let mut fec: Vec<Vec<u8>> = vec![Vec::new(); 3];
    encode(0, &original, &mut fec).unwrap();

    let mut data = original.clone();
    let mut received = fec.clone();
    decode(0, &mut data, &[0, 2, 4], &mut received, &[0, 1, 2]).unwrap();
    assert_eq!(data, original);
}

#[test]
fn test_zero_data_blocks_rejected() {
    let data: Vec<Vec<u8>> = Vec::new();
    let mut fec = vec![vec![0u8; 4]];
    assert_eq!(encode(4, &data, &mut fec), Err(FecError::NoDataBlocks));
}

#[test]
fn test_encode_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(5);
    let data = random_batch(&mut rng, 7, 129);
    let first = encode_batch(&data, 4, 129);

    let mut again = first.clone();
    encode(129, &data, &mut again).unwrap();
    assert_eq!(again, first);
}

#[test]
fn test_systematic_data_blocks_untouched_by_encode() {
    let mut rng = StdRng::seed_from_u64(6);
    let data = random_batch(&mut rng, 4, 50);
    let snapshot = data.clone();
    encode_batch(&data, 2, 50);
    assert_eq!(data, snapshot);
}

#[test]
fn test_more_erasures_than_redundancy() {
    let mut rng = StdRng::seed_from_u64(7);
    let original = random_batch(&mut rng, 8, 32);
    let fec = encode_batch(&original, 2, 32);

    let mut data = original.clone();
    let mut received = vec![fec[0].clone(), fec[1].clone()];
    assert_eq!(
        decode(32, &mut data, &[0, 1, 2], &mut received, &[0, 1]),
        Err(FecError::InsufficientRedundancy {
            erased: 3,
            received: 2
        })
    );
}

#[test]
fn test_duplicate_indices_rejected() {
    let mut data = vec![vec![0u8; 4]; 4];
    let mut received = vec![vec![0u8; 4]; 2];
    assert_eq!(
        decode(4, &mut data, &[1, 1], &mut received, &[0, 1]),
        Err(FecError::DuplicateDataIndex { index: 1 })
    );
    assert_eq!(
        decode(4, &mut data, &[1, 2], &mut received, &[0, 0]),
        Err(FecError::DuplicateFecIndex { index: 0 })
    );
}

#[test]
fn test_short_buffers_rejected() {
    let mut data = vec![vec![0u8; 8], vec![0u8; 8], vec![0u8; 4]];
    let mut received = vec![vec![0u8; 8]];
    assert_eq!(
        decode(8, &mut data, &[2], &mut received, &[0]),
        Err(FecError::BlockTooShort {
            kind: BlockKind::Data,
            index: 2,
            len: 4,
            fragment_len: 8
        })
    );
}

#[test]
fn test_oversized_buffers_keep_their_tail() {
    let mut rng = StdRng::seed_from_u64(8);
    let original = random_batch(&mut rng, 3, 40);
    let mut fec = vec![vec![0x11u8; 48]; 2];
    encode(40, &original, &mut fec).unwrap();
    assert!(fec.iter().all(|block| block[40..].iter().all(|&b| b == 0x11)));

    let mut data = original.clone();
    data[1] = vec![0u8; 40];
    let mut received = vec![fec[1].clone()];
    decode(40, &mut data, &[1], &mut received, &[1]).unwrap();
    assert_eq!(data, original);
}

#[test]
fn test_borrowed_slices_as_blocks() {
    let mut rng = StdRng::seed_from_u64(9);
    let storage = random_batch(&mut rng, 4, 16);
    let data: Vec<&[u8]> = storage.iter().map(|b| b.as_slice()).collect();

    let mut fec_storage = [[0u8; 16]; 2];
    {
        let mut fec: Vec<&mut [u8]> = fec_storage.iter_mut().map(|b| b.as_mut_slice()).collect();
        encode(16, &data, &mut fec).unwrap();
    }

    let mut damaged = storage.clone();
    damaged[0].fill(0);
    damaged[3].fill(0);
    let mut received: Vec<&mut [u8]> = fec_storage.iter_mut().map(|b| b.as_mut_slice()).collect();
    decode(16, &mut damaged, &[0, 3], &mut received, &[0, 1]).unwrap();
    assert_eq!(damaged, storage);
}

#[test]
fn test_parallel_paths_match() {
    let mut rng = StdRng::seed_from_u64(10);
    let original = random_batch(&mut rng, 30, 500);
    let fec = encode_batch(&original, 12, 500);

    let mut par_fec = vec![vec![0u8; 500]; 12];
    encode_parallel(500, &original, &mut par_fec).unwrap();
    assert_eq!(par_fec, fec);

    let erased = [29, 0, 14, 7, 21];
    let fec_indices = [11, 3, 0, 6, 8];
    let mut data = original.clone();
    for &e in &erased {
        data[e].fill(0);
    }
    let mut received: Vec<Vec<u8>> = fec_indices.iter().map(|&r| fec[r].clone()).collect();
    decode_parallel(500, &mut data, &erased, &mut received, &fec_indices).unwrap();
    assert_eq!(data, original);
}

#[test]
fn test_codec_surplus_redundancy() {
    let mut rng = StdRng::seed_from_u64(11);
    for parallel in [false, true] {
        let codec = FecCodec::new(8, 2).unwrap().parallel(parallel);
        let original = random_batch(&mut rng, 8, 1024);
        let mut fec = vec![vec![0u8; 1024]; 2];
        codec.encode(1024, &original, &mut fec).unwrap();

        // Row 1 listed first, so row 0 is the surplus block
        let mut received = vec![fec[1].clone(), fec[0].clone()];
        let mut data = original.clone();
        data[5].fill(0);
        codec.decode(1024, &mut data, &[5], &mut received, &[1, 0]).unwrap();
        assert_eq!(data, original);
        assert_eq!(received[1], fec[0]);
    }
}

#[test]
fn test_codec_insufficient_redundancy() {
    let codec = FecCodec::new(9, 3).unwrap();
    assert!(!codec.can_recover(4));

    let mut data = vec![vec![0u8; 8]; 9];
    let mut fec = vec![vec![0u8; 8]; 2];
    assert_eq!(
        codec.decode(8, &mut data, &[0, 1, 2], &mut fec, &[0, 1]),
        Err(FecError::InsufficientRedundancy {
            erased: 3,
            received: 2
        })
    );
}
