mod proptest_codec;
