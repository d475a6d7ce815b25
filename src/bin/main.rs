fn main() {
  doginals::main()
}
